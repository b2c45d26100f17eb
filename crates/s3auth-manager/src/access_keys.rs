//! Access key lifecycle: generation, revocation, and listing, with the
//! tenant's `max_access_keys` quota enforced before a new key is minted.

use s3auth_core::{AccessKey, AccessKeyStatus, AuthError, AuthResult, User};
use s3auth_credentials::{generate_access_key_id, generate_secret_access_key};

use crate::AuthManager;

impl AuthManager {
    /// Generate and persist a new access key pair for `user`, returning the
    /// plaintext secret exactly once.
    pub async fn generate_access_key(&self, user: &User) -> AuthResult<AccessKey> {
        if let Some(tenant_id) = &user.tenant_id {
            let tenant = self.store.get_tenant(tenant_id).await?;
            if !tenant.access_keys_unlimited() {
                let existing = self.store.count_active_access_keys_by_tenant(tenant_id).await?;
                if existing + 1 > tenant.max_access_keys {
                    return Err(AuthError::QuotaExceeded(format!(
                        "tenant {tenant_id} access key quota exceeded: {existing} + 1 > {}",
                        tenant.max_access_keys
                    )));
                }
            }
        }

        let now = chrono::Utc::now().timestamp();
        let key = AccessKey {
            access_key_id: generate_access_key_id(),
            secret_access_key: generate_secret_access_key(),
            user_id: user.user_id.clone(),
            status: AccessKeyStatus::Active,
            created_at: now,
            last_used: None,
        };
        self.store.create_access_key(&key).await?;
        Ok(key)
    }

    /// Revoke an access key by id.
    pub async fn revoke_access_key(&self, access_key_id: &str) -> AuthResult<()> {
        Ok(self.store.revoke_access_key(access_key_id).await?)
    }

    /// List a user's access keys.
    pub async fn list_access_keys_by_user(&self, user: &User) -> AuthResult<Vec<AccessKey>> {
        Ok(self.store.list_access_keys_by_user(&user.user_id).await?)
    }
}
