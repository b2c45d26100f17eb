//! Tenant quota enforcement.
//!
//! Storage-quota checking is the security-critical path: a tenant's local
//! `current_storage_bytes` counter can drift under concurrent writes to
//! different cluster nodes, so when a cluster is attached the check
//! defers to it as the authoritative source and only falls back to the
//! local counter if the aggregator itself fails.

use std::sync::Arc;

use async_trait::async_trait;
use s3auth_core::{AuthError, AuthResult, TenantId};
use s3auth_store::Store;
use tracing::warn;

/// Oracle for cluster-wide tenant storage usage. The core treats this
/// purely as a read-only source of truth — it never writes through it.
#[async_trait]
pub trait ClusterAggregator: Send + Sync + std::fmt::Debug {
    /// Total bytes used by `tenant_id` across every node in the cluster.
    async fn get_tenant_total_storage(&self, tenant_id: &TenantId) -> Result<i64, anyhow::Error>;

    /// Whether clustering is currently enabled. When `false`, the quota
    /// check uses the tenant's local counter without consulting this trait.
    fn clustering_enabled(&self) -> bool;
}

/// Checks tenant storage and bucket quotas against the persistent store and
/// an optional cluster aggregator.
#[derive(Debug, Clone)]
pub struct QuotaEnforcer {
    store: Store,
    cluster: Option<Arc<dyn ClusterAggregator>>,
}

impl QuotaEnforcer {
    /// Build an enforcer with no cluster aggregator attached (single-node mode).
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store, cluster: None }
    }

    /// Attach a cluster aggregator.
    #[must_use]
    pub fn with_cluster(mut self, cluster: Arc<dyn ClusterAggregator>) -> Self {
        self.cluster = Some(cluster);
        self
    }

    /// Check whether writing `additional_bytes` more to `tenant_id` would
    /// exceed its storage quota.
    ///
    /// An empty `tenant_id` is a global-admin write and is never checked. A
    /// tenant with `max_storage_bytes == 0` is unlimited.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::QuotaExceeded`] with the observed usage if the
    /// write would exceed the cap, or a store error if the tenant lookup fails.
    pub async fn check_storage_quota(&self, tenant_id: Option<&TenantId>, additional_bytes: i64) -> AuthResult<()> {
        let Some(tenant_id) = tenant_id else {
            return Ok(());
        };

        let tenant = self.store.get_tenant(tenant_id).await?;
        if tenant.storage_unlimited() {
            return Ok(());
        }

        let current = self.observed_storage_usage(tenant_id, tenant.current_storage_bytes).await;

        if current + additional_bytes > tenant.max_storage_bytes {
            return Err(AuthError::QuotaExceeded(format!(
                "tenant {tenant_id} storage quota exceeded: {current} + {additional_bytes} > {}",
                tenant.max_storage_bytes
            )));
        }

        Ok(())
    }

    /// Check whether adding one more bucket to `tenant_id` would exceed its
    /// bucket quota. Always local — bucket counts are not cluster-aggregated.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::QuotaExceeded`] if the cap would be exceeded.
    pub async fn check_bucket_quota(&self, tenant_id: &TenantId) -> AuthResult<()> {
        let tenant = self.store.get_tenant(tenant_id).await?;
        if tenant.buckets_unlimited() {
            return Ok(());
        }

        if tenant.current_buckets + 1 > tenant.max_buckets {
            return Err(AuthError::QuotaExceeded(format!(
                "tenant {tenant_id} bucket quota exceeded: {} + 1 > {}",
                tenant.current_buckets, tenant.max_buckets
            )));
        }

        Ok(())
    }

    async fn observed_storage_usage(&self, tenant_id: &TenantId, local_fallback: i64) -> i64 {
        let Some(cluster) = &self.cluster else {
            return local_fallback;
        };

        if !cluster.clustering_enabled() {
            return local_fallback;
        }

        match cluster.get_tenant_total_storage(tenant_id).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%tenant_id, error = %err, "cluster aggregator failed, falling back to local storage counter");
                local_fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3auth_core::{Metadata, Tenant, TenantStatus};

    #[derive(Debug)]
    struct FixedAggregator {
        total: i64,
        fail: bool,
    }

    #[async_trait]
    impl ClusterAggregator for FixedAggregator {
        async fn get_tenant_total_storage(&self, _tenant_id: &TenantId) -> Result<i64, anyhow::Error> {
            if self.fail {
                Err(anyhow::anyhow!("aggregator unreachable"))
            } else {
                Ok(self.total)
            }
        }

        fn clustering_enabled(&self) -> bool {
            true
        }
    }

    async fn seeded_store(max_storage_bytes: i64, max_buckets: i64, current_storage: i64, current_buckets: i64) -> (Store, TenantId) {
        let pool = sqlx::sqlite::SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap();
        let store = Store::from_pool(pool).await.unwrap();
        let tenant_id = TenantId::new();
        let tenant = Tenant {
            tenant_id: tenant_id.clone(),
            name: "acme".to_owned(),
            display_name: "Acme".to_owned(),
            description: String::new(),
            status: TenantStatus::Active,
            max_access_keys: 0,
            max_storage_bytes,
            max_buckets,
            current_storage_bytes: current_storage,
            current_buckets: current_buckets,
            metadata: Metadata::new(),
            created_at: 1,
            updated_at: 1,
        };
        store.create_tenant(&tenant).await.unwrap();
        (store, tenant_id)
    }

    #[tokio::test]
    async fn test_should_skip_check_for_global_admin() {
        let (store, _) = seeded_store(100, 10, 0, 0).await;
        let enforcer = QuotaEnforcer::new(store);
        assert!(enforcer.check_storage_quota(None, 1_000_000).await.is_ok());
    }

    #[tokio::test]
    async fn test_should_skip_check_when_unlimited() {
        let (store, tenant_id) = seeded_store(0, 10, 0, 0).await;
        let enforcer = QuotaEnforcer::new(store);
        assert!(enforcer.check_storage_quota(Some(&tenant_id), 1_000_000_000).await.is_ok());
    }

    #[tokio::test]
    async fn test_should_reject_over_quota_write_using_local_counter() {
        let (store, tenant_id) = seeded_store(1000, 10, 900, 0).await;
        let enforcer = QuotaEnforcer::new(store);
        let result = enforcer.check_storage_quota(Some(&tenant_id), 200).await;
        assert!(matches!(result, Err(AuthError::QuotaExceeded(_))));
    }

    #[tokio::test]
    async fn test_should_prefer_cluster_usage_over_local() {
        let (store, tenant_id) = seeded_store(1000, 10, 0, 0).await;
        let enforcer = QuotaEnforcer::new(store).with_cluster(Arc::new(FixedAggregator { total: 950, fail: false }));
        let result = enforcer.check_storage_quota(Some(&tenant_id), 100).await;
        assert!(matches!(result, Err(AuthError::QuotaExceeded(_))));
    }

    #[tokio::test]
    async fn test_should_fall_back_to_local_on_aggregator_error() {
        let (store, tenant_id) = seeded_store(1000, 10, 10, 0).await;
        let enforcer = QuotaEnforcer::new(store).with_cluster(Arc::new(FixedAggregator { total: 0, fail: true }));
        let result = enforcer.check_storage_quota(Some(&tenant_id), 100).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_should_reject_bucket_quota_exceeded() {
        let (store, tenant_id) = seeded_store(0, 1, 0, 1).await;
        let enforcer = QuotaEnforcer::new(store);
        let result = enforcer.check_bucket_quota(&tenant_id).await;
        assert!(matches!(result, Err(AuthError::QuotaExceeded(_))));
    }
}
