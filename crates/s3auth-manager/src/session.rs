//! JWT session issuance and verification at the manager level.

use s3auth_core::{AuthError, AuthResult, User};
use s3auth_credentials::session::{issue, verify};

use crate::AuthManager;

impl AuthManager {
    /// Issue a 24-hour session token for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if token encoding fails.
    pub fn issue_jwt(&self, user: &User) -> AuthResult<String> {
        let now = chrono::Utc::now().timestamp();
        let roles: Vec<String> = user.roles.iter().map(|r| r.as_str().to_owned()).collect();
        issue(
            &user.user_id.0,
            user.tenant_id.as_ref().map(|t| t.0.as_str()),
            &user.username,
            &roles,
            &self.config.session_secret,
            now,
            self.config.session_ttl_seconds,
        )
    }

    /// Verify a session token and resolve it back to its owning, still-active user.
    pub async fn verify_jwt(&self, token: &str) -> AuthResult<User> {
        let claims = verify(token, &self.config.session_secret)?;
        let user = self.store.get_user_by_username(&claims.access_key).await.map_err(|_| AuthError::UserNotFound)?;
        if user.status != s3auth_core::UserStatus::Active {
            return Err(AuthError::UserInactive);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::test_manager;
    use s3auth_core::{Metadata, Role, TwoFactorState, UserId, UserStatus};

    fn sample_user() -> User {
        User {
            user_id: UserId::new(),
            username: "grace".to_owned(),
            password_hash: String::new(),
            display_name: "Grace".to_owned(),
            email: "grace@example.com".to_owned(),
            status: UserStatus::Active,
            tenant_id: None,
            roles: vec![Role::Member],
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
    async fn test_should_issue_and_verify_jwt_roundtrip() {
        let manager = test_manager().await;
        let user = sample_user();
        manager.store().create_user(&user).await.unwrap();

        let token = manager.issue_jwt(&user).unwrap();
        let verified = manager.verify_jwt(&token).await.unwrap();
        assert_eq!(verified.user_id, user.user_id);
    }

    #[tokio::test]
    async fn test_should_reject_jwt_for_deleted_user() {
        let manager = test_manager().await;
        let user = sample_user();
        manager.store().create_user(&user).await.unwrap();
        let token = manager.issue_jwt(&user).unwrap();

        manager.store().delete_user(&user.user_id, 2).await.unwrap();

        let result = manager.verify_jwt(&token).await;
        assert!(result.is_err());
    }
}
