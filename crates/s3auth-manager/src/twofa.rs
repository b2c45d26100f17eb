//! Two-factor authentication: TOTP provisioning, enablement, verification,
//! and backup codes.

use s3auth_core::{AuthError, AuthResult, User, UserId};
use s3auth_credentials::{backup_codes, totp};

use crate::audit::AuditEvent;
use crate::AuthManager;

const ISSUER: &str = "s3auth";

impl AuthManager {
    /// Provision a fresh TOTP secret for `user`. Stateless: nothing is
    /// persisted until [`AuthManager::enable_2fa`] is called with a code
    /// that verifies against the returned secret.
    pub fn setup_2fa(&self, user: &User) -> AuthResult<totp::Provisioned> {
        totp::provision(ISSUER, &user.username)
    }

    /// Verify `code` against `secret`, then persist the secret and a fresh
    /// set of backup codes, returning the plaintext codes exactly once.
    pub async fn enable_2fa(&self, user: &User, code: &str, secret: &str) -> AuthResult<Vec<String>> {
        let now = chrono::Utc::now().timestamp();
        if !totp::verify(secret, code, now) {
            return Err(AuthError::InvalidCredentials);
        }

        let codes = backup_codes::generate_codes();
        let hashed = backup_codes::hash_codes(&codes)?;
        self.store.enable_2fa(&user.user_id, secret, &hashed, now).await?;
        self.audit.record(AuditEvent::TwoFactorEnabled { user_id: user.user_id.clone() });
        Ok(codes)
    }

    /// Verify a presented 2FA code, classifying it as a backup code or a
    /// TOTP code by shape. A matched backup code is marked used so it
    /// cannot be replayed.
    pub async fn verify_2fa_code(&self, user: &User, code: &str) -> AuthResult<bool> {
        if backup_codes::has_backup_code_shape(code) {
            let check = backup_codes::check_code(
                code,
                &user.two_factor.backup_code_hashes,
                &user.two_factor.used_backup_code_hashes,
            );
            if check.matched {
                if let Some(index) = check.matched_index {
                    let hash = user.two_factor.backup_code_hashes[index].clone();
                    self.store.mark_backup_code_used(&user.user_id, &hash).await?;
                }
                return Ok(true);
            }
            return Ok(false);
        }

        let Some(secret) = user.two_factor.secret.as_deref() else {
            return Ok(false);
        };
        let now = chrono::Utc::now().timestamp();
        Ok(totp::verify(secret, code, now))
    }

    /// Disable 2FA for `user`. Disabling another user's 2FA requires the
    /// requesting user to be a global admin.
    pub async fn disable_2fa(&self, user: &User, requesting_user: &User, is_global_admin: bool) -> AuthResult<()> {
        if requesting_user.user_id != user.user_id && !is_global_admin {
            return Err(AuthError::AccessDenied);
        }

        let now = chrono::Utc::now().timestamp();
        self.store.disable_2fa(&user.user_id, now).await?;
        self.audit.record(AuditEvent::TwoFactorDisabled { user_id: user.user_id.clone() });
        Ok(())
    }

    /// Replace `user_id`'s backup codes, clearing the used list, returning
    /// the new plaintext codes once.
    pub async fn regenerate_backup_codes(&self, user_id: &UserId) -> AuthResult<Vec<String>> {
        let codes = backup_codes::generate_codes();
        let hashed = backup_codes::hash_codes(&codes)?;
        self.store.update_backup_codes(user_id, &hashed).await?;
        Ok(codes)
    }
}
