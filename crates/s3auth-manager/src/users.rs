//! User lifecycle operations: transactional wrappers over the store that
//! emit audit events and enforce the one manager-level invariant the store
//! itself does not — the `admin` user can never be deleted.

use s3auth_core::{AuthError, AuthResult, TenantId, User, UserId, UserStatus};

use crate::audit::AuditEvent;
use crate::AuthManager;

impl AuthManager {
    /// Create a new user and audit the creation.
    pub async fn create_user(&self, user: &User) -> AuthResult<()> {
        self.store.create_user(user).await?;
        self.audit.record(AuditEvent::UserCreated { user_id: user.user_id.clone() });
        Ok(())
    }

    /// Fetch a user by id.
    pub async fn get_user(&self, user_id: &UserId) -> AuthResult<User> {
        Ok(self.store.get_user(user_id).await?)
    }

    /// List users, optionally scoped to a tenant.
    pub async fn list_users(&self, tenant_id: Option<&TenantId>) -> AuthResult<Vec<User>> {
        Ok(self.store.list_users(tenant_id).await?)
    }

    /// Update a user's mutable attributes, auditing a block/unblock
    /// transition separately from a plain update when `status` changes.
    pub async fn update_user(&self, previous: &User, updated: &User) -> AuthResult<()> {
        self.store.update_user(updated).await?;

        match (previous.status, updated.status) {
            (UserStatus::Active, UserStatus::Suspended | UserStatus::Inactive) => {
                self.audit.record(AuditEvent::UserBlocked { user_id: updated.user_id.clone() });
            }
            (UserStatus::Suspended | UserStatus::Inactive, UserStatus::Active) => {
                self.audit.record(AuditEvent::UserUnblocked { user_id: updated.user_id.clone() });
            }
            _ => self.audit.record(AuditEvent::UserUpdated { user_id: updated.user_id.clone() }),
        }
        Ok(())
    }

    /// Tombstone a user, cascading to their access keys. The reserved
    /// `admin` id can never be deleted.
    pub async fn delete_user(&self, user_id: &UserId, now: i64) -> AuthResult<()> {
        if user_id.is_admin() {
            return Err(AuthError::AccessDenied);
        }
        self.store.delete_user(user_id, now).await?;
        self.audit.record(AuditEvent::UserDeleted { user_id: user_id.clone() });
        Ok(())
    }
}
