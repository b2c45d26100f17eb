//! The composed auth manager.

use std::sync::Arc;

use s3auth_core::{AuthConfig, NoopSettingsProvider, SettingsProvider};
use s3auth_quota::QuotaEnforcer;
use s3auth_ratelimit::RateLimiter;
use s3auth_store::Store;

use crate::audit::{AuditSink, TracingAuditSink};

/// Composition root for the auth/tenancy core. Wraps the persistent store,
/// the per-IP rate limiter, the quota enforcer, and the audit sink behind
/// the single set of operations external callers use.
#[derive(Debug, Clone)]
pub struct AuthManager {
    pub(crate) store: Store,
    pub(crate) rate_limiter: Arc<RateLimiter>,
    pub(crate) quota: QuotaEnforcer,
    pub(crate) config: AuthConfig,
    pub(crate) settings: Arc<dyn SettingsProvider>,
    pub(crate) audit: Arc<dyn AuditSink>,
}

impl AuthManager {
    /// Build a manager over `store` using `config`'s defaults, no settings
    /// overrides, a log-only audit sink, and no cluster aggregator.
    #[must_use]
    pub fn new(store: Store, config: AuthConfig) -> Self {
        let rate_limiter = Arc::new(RateLimiter::from_config(&config));
        let quota = QuotaEnforcer::new(store.clone());
        Self {
            store,
            rate_limiter,
            quota,
            config,
            settings: Arc::new(NoopSettingsProvider),
            audit: Arc::new(TracingAuditSink),
        }
    }

    /// Replace the runtime settings provider.
    #[must_use]
    pub fn with_settings(mut self, settings: Arc<dyn SettingsProvider>) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Attach a cluster aggregator to the quota enforcer.
    #[must_use]
    pub fn with_cluster(mut self, cluster: Arc<dyn s3auth_quota::ClusterAggregator>) -> Self {
        self.quota = self.quota.with_cluster(cluster);
        self
    }

    /// The underlying store, for callers that need direct access (e.g. the
    /// bucket layer maintaining quota counters).
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The per-IP login rate limiter.
    #[must_use]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// The quota enforcer.
    #[must_use]
    pub fn quota(&self) -> &QuotaEnforcer {
        &self.quota
    }

    pub(crate) fn max_failed_attempts(&self) -> i64 {
        s3auth_core::max_failed_attempts(&self.config, &self.settings)
    }

    pub(crate) fn lockout_duration_seconds(&self) -> i64 {
        s3auth_core::lockout_duration_seconds(&self.config, &self.settings)
    }
}

#[cfg(test)]
pub(crate) async fn test_manager() -> AuthManager {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite connects");
    let store = Store::from_pool(pool).await.expect("schema establishes");
    AuthManager::new(store, AuthConfig::default())
}
