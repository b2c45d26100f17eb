//! The composed console login path: rate limit, account lockout, and
//! credential verification, with audit events emitted for every outcome.

use s3auth_core::{AuthError, AuthResult, User};

use crate::audit::AuditEvent;
use crate::AuthManager;

impl AuthManager {
    /// Authenticate a console login attempt from `ip`.
    ///
    /// Order of gates: per-IP rate limiter, then the user's own lockout
    /// state, then credential verification. A credential failure after the
    /// gates pass records a failed attempt against both the rate limiter
    /// and the user's lockout counter, locking the account if the
    /// configured threshold is reached. A successful login resets both.
    pub async fn login(&self, ip: &str, username: &str, password: &str, now: i64) -> AuthResult<User> {
        if !self.rate_limiter.allow(ip, now) {
            return Err(AuthError::RateLimited);
        }

        let user = match self.store.get_user_by_username(username).await {
            Ok(user) => user,
            Err(_) => {
                self.rate_limiter.record_failed(ip, now);
                self.audit.record(AuditEvent::LoginFailed { username: username.to_owned() });
                return Err(AuthError::InvalidCredentials);
            }
        };

        if self.is_account_locked(&user.user_id, now).await? {
            return Err(AuthError::AccountLocked);
        }

        match self.verify_console_credentials(username, password).await {
            Ok(user) => {
                self.rate_limiter.reset(ip);
                if let Err(err) = self.store.reset_failed_login_attempts(&user.user_id).await {
                    tracing::warn!(username, error = %err, "failed to reset failed login counter after success");
                }
                Ok(user)
            }
            Err(err) => {
                self.rate_limiter.record_failed(ip, now);
                self.audit.record(AuditEvent::LoginFailed { username: username.to_owned() });
                self.record_failed_login(&user.user_id, now).await;
                Err(err)
            }
        }
    }

    /// Whether `user_id`'s account is currently locked, auto-unlocking an
    /// expired lock as a side effect.
    pub async fn is_account_locked(&self, user_id: &s3auth_core::UserId, now: i64) -> AuthResult<bool> {
        let (_, locked_until) = self.store.get_account_lock_status(user_id).await?;
        if locked_until == 0 {
            return Ok(false);
        }
        if locked_until <= now {
            self.store.unlock_account(user_id, now).await?;
            self.audit.record(AuditEvent::UserUnblocked { user_id: user_id.clone() });
            return Ok(false);
        }
        Ok(true)
    }

    async fn record_failed_login(&self, user_id: &s3auth_core::UserId, now: i64) {
        let attempts = match self.store.increment_failed_login_attempts(user_id, now).await {
            Ok(attempts) => attempts,
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "failed to increment failed login counter");
                return;
            }
        };

        if attempts >= self.max_failed_attempts() {
            let duration = self.lockout_duration_seconds();
            if let Err(err) = self.store.lock_account(user_id, duration, now).await {
                tracing::warn!(%user_id, error = %err, "failed to lock account after repeated failures");
                return;
            }
            self.audit.record(AuditEvent::UserBlocked { user_id: user_id.clone() });
        }
    }
}
