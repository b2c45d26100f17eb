//! Tenant lifecycle: thin delegation to the store. `delete_tenant` cascades
//! to the tenant's users and their access keys, all inside the store's own
//! transaction.

use s3auth_core::{AuthResult, Tenant, TenantId};

use crate::AuthManager;

impl AuthManager {
    /// Create a tenant.
    pub async fn create_tenant(&self, tenant: &Tenant) -> AuthResult<()> {
        Ok(self.store.create_tenant(tenant).await?)
    }

    /// Fetch a tenant by id.
    pub async fn get_tenant(&self, tenant_id: &TenantId) -> AuthResult<Tenant> {
        Ok(self.store.get_tenant(tenant_id).await?)
    }

    /// List every non-deleted tenant.
    pub async fn list_tenants(&self) -> AuthResult<Vec<Tenant>> {
        Ok(self.store.list_tenants().await?)
    }

    /// Update a tenant's mutable attributes.
    pub async fn update_tenant(&self, tenant: &Tenant) -> AuthResult<()> {
        Ok(self.store.update_tenant(tenant).await?)
    }

    /// Tombstone a tenant, cascading to its users and their access keys.
    pub async fn delete_tenant(&self, tenant_id: &TenantId, now: i64) -> AuthResult<()> {
        Ok(self.store.delete_tenant(tenant_id, now).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::test_manager;
    use s3auth_core::{Metadata, TenantStatus};

    fn sample_tenant() -> Tenant {
        Tenant {
            tenant_id: TenantId::new(),
            name: "globex".to_owned(),
            display_name: "Globex".to_owned(),
            description: String::new(),
            status: TenantStatus::Active,
            max_access_keys: 0,
            max_storage_bytes: 0,
            max_buckets: 0,
            current_storage_bytes: 0,
            current_buckets: 0,
            metadata: Metadata::new(),
            created_at: 1,
            updated_at: 1,
        }
    }

    #[tokio::test]
    async fn test_should_create_and_fetch_tenant() {
        let manager = test_manager().await;
        let tenant = sample_tenant();
        manager.create_tenant(&tenant).await.unwrap();

        let fetched = manager.get_tenant(&tenant.tenant_id).await.unwrap();
        assert_eq!(fetched.name, "globex");
    }

    #[tokio::test]
    async fn test_should_delete_tenant() {
        let manager = test_manager().await;
        let tenant = sample_tenant();
        manager.create_tenant(&tenant).await.unwrap();

        manager.delete_tenant(&tenant.tenant_id, 100).await.unwrap();
        let fetched = manager.get_tenant(&tenant.tenant_id).await.unwrap();
        assert_eq!(fetched.status, TenantStatus::Deleted);
    }
}
