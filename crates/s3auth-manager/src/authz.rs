//! Bucket authorization policy.
//!
//! Resource ownership has no separate field in the persisted model: a
//! user who created a bucket is recorded the same way as any other grantee,
//! as an explicit `admin`-level [`s3auth_core::BucketPermission`] for that
//! user. So "owner of a resource" and "explicit admin grant" are the same
//! check here rather than two.

use s3auth_core::{AuthError, AuthResult, Metadata, PermissionLevel, Role, TenantId, TwoFactorState, User, UserId, UserStatus};

use crate::AuthManager;

impl AuthManager {
    /// Authorize `principal` for `requested` access on `bucket_name`, owned
    /// by `bucket_owner_tenant` (if any) and marked `bucket_is_public` by
    /// the bucket layer.
    pub async fn authorize_bucket_action(
        &self,
        principal: &User,
        bucket_name: &str,
        bucket_owner_tenant: Option<&TenantId>,
        bucket_is_public: bool,
        requested: PermissionLevel,
        now: i64,
    ) -> AuthResult<()> {
        // A real global admin has reserved id "admin"; the synthetic
        // anonymous principal (see `anonymous_principal`) carries the same
        // null-tenant admin shape without that reserved id, and is granted
        // the same unconditional access.
        if principal.tenant_id.is_none() && principal.roles.contains(&Role::Admin) {
            return Ok(());
        }

        if principal.is_tenant_admin() && principal.tenant_id.as_ref() == bucket_owner_tenant {
            return Ok(());
        }

        let (has_grant, level) = self.store.check_bucket_access(bucket_name, &principal.user_id, now).await?;
        if has_grant && level.is_some_and(|level| level >= requested) {
            return Ok(());
        }

        if bucket_is_public && requested == PermissionLevel::Read {
            return Ok(());
        }

        Err(AuthError::AccessDenied)
    }

    /// If anonymous S3 access is enabled (development mode), return the
    /// synthetic admin principal anonymous requests are granted. Returns
    /// `None` when anonymous access is disabled, in which case the caller
    /// must require a real `Authorization` header.
    #[must_use]
    pub fn anonymous_principal(&self) -> Option<User> {
        if !self.config.allow_anonymous {
            return None;
        }

        Some(User {
            user_id: UserId::from("anonymous".to_owned()),
            username: "anonymous".to_owned(),
            password_hash: String::new(),
            display_name: "Anonymous".to_owned(),
            email: String::new(),
            status: UserStatus::Active,
            tenant_id: None,
            roles: vec![Role::Admin],
            policies: Vec::new(),
            metadata: Metadata::new(),
            ui_theme: "light".to_owned(),
            ui_language: "en".to_owned(),
            two_factor: TwoFactorState::default(),
            failed_login_attempts: 0,
            last_failed_login: None,
            locked_until: 0,
            created_at: 0,
            updated_at: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::test_manager;
    use s3auth_core::{BucketPermission, GrantPrincipal};

    fn sample_user(tenant_id: Option<TenantId>, roles: Vec<Role>) -> User {
        User {
            user_id: UserId::new(),
            username: "principal".to_owned(),
            password_hash: String::new(),
            display_name: "Test".to_owned(),
            email: "test@example.com".to_owned(),
            status: UserStatus::Active,
            tenant_id,
            roles,
            policies: Vec::new(),
            metadata: Metadata::new(),
            ui_theme: "light".to_owned(),
            ui_language: "en".to_owned(),
            two_factor: TwoFactorState::default(),
            failed_login_attempts: 0,
            last_failed_login: None,
            locked_until: 0,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[tokio::test]
    async fn test_should_deny_member_with_no_grant() {
        let manager = test_manager().await;
        let user = sample_user(None, vec![Role::Member]);
        let result = manager.authorize_bucket_action(&user, "bucket1", None, false, PermissionLevel::Read, 100).await;
        assert!(matches!(result, Err(AuthError::AccessDenied)));
    }

    #[tokio::test]
    async fn test_should_allow_public_bucket_read() {
        let manager = test_manager().await;
        let user = sample_user(None, vec![Role::Member]);
        let result = manager.authorize_bucket_action(&user, "bucket1", None, true, PermissionLevel::Read, 100).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_should_deny_public_bucket_write() {
        let manager = test_manager().await;
        let user = sample_user(None, vec![Role::Member]);
        let result = manager.authorize_bucket_action(&user, "bucket1", None, true, PermissionLevel::Write, 100).await;
        assert!(matches!(result, Err(AuthError::AccessDenied)));
    }

    #[tokio::test]
    async fn test_should_allow_explicit_grant_at_sufficient_level() {
        let manager = test_manager().await;
        let user = sample_user(None, vec![Role::Member]);
        let grant = BucketPermission {
            permission_id: "p1".to_owned(),
            bucket_name: "bucket1".to_owned(),
            principal: GrantPrincipal::User(user.user_id.clone()),
            level: PermissionLevel::Write,
            granted_by: None,
            granted_at: 1,
            expires_at: None,
        };
        manager.upsert_bucket_grant(&grant).await.unwrap();

        let result = manager.authorize_bucket_action(&user, "bucket1", None, false, PermissionLevel::Write, 100).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_should_allow_tenant_admin_within_tenant() {
        let manager = test_manager().await;
        let tenant_id = TenantId::new();
        let admin = sample_user(Some(tenant_id.clone()), vec![Role::Admin]);
        let result = manager.authorize_bucket_action(&admin, "bucket1", Some(&tenant_id), false, PermissionLevel::Admin, 100).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_should_not_synthesize_anonymous_principal_by_default() {
        let manager = test_manager().await;
        assert!(manager.anonymous_principal().is_none());
    }

    #[tokio::test]
    async fn test_should_synthesize_anonymous_admin_when_enabled() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap();
        let store = s3auth_store::Store::from_pool(pool).await.unwrap();
        let mut config = s3auth_core::AuthConfig::default();
        config.allow_anonymous = true;
        let manager = AuthManager::new(store, config);

        let principal = manager.anonymous_principal().unwrap();
        assert!(principal.tenant_id.is_none());
        assert!(principal.roles.contains(&Role::Admin));
    }
}
