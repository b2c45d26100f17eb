//! Tenant CRUD and quota-counter maintenance.

use s3auth_core::{Metadata, Tenant, TenantId, TenantStatus};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::error::{StoreError, StoreResult};
use crate::store::Store;

fn status_str(status: TenantStatus) -> &'static str {
    match status {
        TenantStatus::Active => "active",
        TenantStatus::Inactive => "inactive",
        TenantStatus::Deleted => "deleted",
    }
}

fn parse_status(raw: &str) -> TenantStatus {
    match raw {
        "inactive" => TenantStatus::Inactive,
        "deleted" => TenantStatus::Deleted,
        _ => TenantStatus::Active,
    }
}

fn row_to_tenant(row: &SqliteRow) -> StoreResult<Tenant> {
    let metadata_raw: String = row.try_get("metadata")?;
    let metadata: Metadata = serde_json::from_str(&metadata_raw).unwrap_or_default();
    let status_raw: String = row.try_get("status")?;

    Ok(Tenant {
        tenant_id: TenantId(row.try_get("tenant_id")?),
        name: row.try_get("name")?,
        display_name: row.try_get("display_name")?,
        description: row.try_get("description")?,
        status: parse_status(&status_raw),
        max_access_keys: row.try_get("max_access_keys")?,
        max_storage_bytes: row.try_get("max_storage_bytes")?,
        max_buckets: row.try_get("max_buckets")?,
        current_storage_bytes: row.try_get("current_storage_bytes")?,
        current_buckets: row.try_get("current_buckets")?,
        metadata,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl Store {
    /// Create a new tenant. Fails with [`StoreError::AlreadyExists`] if the
    /// name is already taken by a non-deleted tenant.
    pub async fn create_tenant(&self, tenant: &Tenant) -> StoreResult<()> {
        let metadata = serde_json::to_string(&tenant.metadata).unwrap_or_else(|_| "{}".to_owned());

        sqlx::query(
            "INSERT INTO tenants
                (tenant_id, name, display_name, description, status, max_access_keys,
                 max_storage_bytes, max_buckets, current_storage_bytes, current_buckets,
                 metadata, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(tenant.tenant_id.to_string())
        .bind(&tenant.name)
        .bind(&tenant.display_name)
        .bind(&tenant.description)
        .bind(status_str(tenant.status))
        .bind(tenant.max_access_keys)
        .bind(tenant.max_storage_bytes)
        .bind(tenant.max_buckets)
        .bind(tenant.current_storage_bytes)
        .bind(tenant.current_buckets)
        .bind(metadata)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a tenant by id.
    pub async fn get_tenant(&self, tenant_id: &TenantId) -> StoreResult<Tenant> {
        let row = sqlx::query("SELECT * FROM tenants WHERE tenant_id = ?")
            .bind(tenant_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("tenant {tenant_id}")))?;

        row_to_tenant(&row)
    }

    /// Fetch a tenant by its unique name.
    pub async fn get_tenant_by_name(&self, name: &str) -> StoreResult<Tenant> {
        let row = sqlx::query("SELECT * FROM tenants WHERE name = ? AND status != 'deleted'")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("tenant {name}")))?;

        row_to_tenant(&row)
    }

    /// List all non-deleted tenants.
    pub async fn list_tenants(&self) -> StoreResult<Vec<Tenant>> {
        let rows = sqlx::query("SELECT * FROM tenants WHERE status != 'deleted' ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_tenant).collect()
    }

    /// Update a tenant's mutable attributes.
    pub async fn update_tenant(&self, tenant: &Tenant) -> StoreResult<()> {
        let metadata = serde_json::to_string(&tenant.metadata).unwrap_or_else(|_| "{}".to_owned());

        let result = sqlx::query(
            "UPDATE tenants SET display_name = ?, description = ?, status = ?, max_access_keys = ?,
                max_storage_bytes = ?, max_buckets = ?, metadata = ?, updated_at = ?
             WHERE tenant_id = ?",
        )
        .bind(&tenant.display_name)
        .bind(&tenant.description)
        .bind(status_str(tenant.status))
        .bind(tenant.max_access_keys)
        .bind(tenant.max_storage_bytes)
        .bind(tenant.max_buckets)
        .bind(metadata)
        .bind(tenant.updated_at)
        .bind(tenant.tenant_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("tenant {}", tenant.tenant_id)));
        }
        Ok(())
    }

    /// Tombstone a tenant and cascade to its users and their access keys, in
    /// one transaction.
    pub async fn delete_tenant(&self, tenant_id: &TenantId, now: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE access_keys SET status = 'deleted'
             WHERE user_id IN (SELECT user_id FROM users WHERE tenant_id = ?)",
        )
        .bind(tenant_id.to_string())
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET status = 'deleted', updated_at = ? WHERE tenant_id = ?")
            .bind(now)
            .bind(tenant_id.to_string())
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("UPDATE tenants SET status = 'deleted', updated_at = ? WHERE tenant_id = ?")
            .bind(now)
            .bind(tenant_id.to_string())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("tenant {tenant_id}")));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Monotonically increment a tenant's live bucket counter.
    pub async fn increment_tenant_bucket_count(&self, tenant_id: &TenantId) -> StoreResult<()> {
        sqlx::query("UPDATE tenants SET current_buckets = current_buckets + 1 WHERE tenant_id = ?")
            .bind(tenant_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Decrement a tenant's live bucket counter, floored at 0.
    pub async fn decrement_tenant_bucket_count(&self, tenant_id: &TenantId) -> StoreResult<()> {
        sqlx::query(
            "UPDATE tenants SET current_buckets = MAX(current_buckets - 1, 0) WHERE tenant_id = ?",
        )
        .bind(tenant_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Increment a tenant's live storage-usage counter by a signed delta,
    /// floored at 0.
    pub async fn increment_tenant_storage(&self, tenant_id: &TenantId, delta_bytes: i64) -> StoreResult<()> {
        sqlx::query(
            "UPDATE tenants SET current_storage_bytes = MAX(current_storage_bytes + ?, 0) WHERE tenant_id = ?",
        )
        .bind(delta_bytes)
        .bind(tenant_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Decrement a tenant's live storage-usage counter, floored at 0.
    pub async fn decrement_tenant_storage(&self, tenant_id: &TenantId, delta_bytes: i64) -> StoreResult<()> {
        self.increment_tenant_storage(tenant_id, -delta_bytes).await
    }

    /// Live count of active access keys across every user in a tenant.
    pub async fn count_active_access_keys_by_tenant(&self, tenant_id: &TenantId) -> StoreResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM access_keys ak
             JOIN users u ON u.user_id = ak.user_id
             WHERE u.tenant_id = ? AND ak.status = 'active'",
        )
        .bind(tenant_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("n")?)
    }
}
