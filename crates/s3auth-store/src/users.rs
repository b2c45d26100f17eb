//! User CRUD, lockout primitives, and 2FA state management.

use s3auth_core::{Metadata, Role, TenantId, TwoFactorState, User, UserId, UserStatus};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::error::{StoreError, StoreResult};
use crate::store::Store;

fn status_str(status: UserStatus) -> &'static str {
    match status {
        UserStatus::Active => "active",
        UserStatus::Inactive => "inactive",
        UserStatus::Suspended => "suspended",
        UserStatus::Locked => "locked",
        UserStatus::Deleted => "deleted",
    }
}

fn parse_status(raw: &str) -> UserStatus {
    match raw {
        "inactive" => UserStatus::Inactive,
        "suspended" => UserStatus::Suspended,
        "locked" => UserStatus::Locked,
        "deleted" => UserStatus::Deleted,
        _ => UserStatus::Active,
    }
}

fn parse_role(raw: &str) -> Role {
    match raw {
        "admin" => Role::Admin,
        _ => Role::Member,
    }
}

fn row_to_user(row: &SqliteRow) -> StoreResult<User> {
    let status_raw: String = row.try_get("status")?;
    let tenant_id: Option<String> = row.try_get("tenant_id")?;
    let roles_raw: String = row.try_get("roles")?;
    let roles: Vec<String> = serde_json::from_str(&roles_raw).unwrap_or_default();
    let policies_raw: String = row.try_get("policies")?;
    let policies: Vec<String> = serde_json::from_str(&policies_raw).unwrap_or_default();
    let metadata_raw: String = row.try_get("metadata")?;
    let metadata: Metadata = serde_json::from_str(&metadata_raw).unwrap_or_default();
    let backup_codes_raw: String = row.try_get("backup_code_hashes")?;
    let backup_code_hashes: Vec<String> = serde_json::from_str(&backup_codes_raw).unwrap_or_default();
    let used_codes_raw: String = row.try_get("used_backup_code_hashes")?;
    let used_backup_code_hashes: Vec<String> = serde_json::from_str(&used_codes_raw).unwrap_or_default();

    Ok(User {
        user_id: UserId(row.try_get("user_id")?),
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        display_name: row.try_get("display_name")?,
        email: row.try_get("email")?,
        status: parse_status(&status_raw),
        tenant_id: tenant_id.map(TenantId),
        roles: roles.iter().map(|r| parse_role(r)).collect(),
        policies,
        metadata,
        ui_theme: row.try_get("ui_theme")?,
        ui_language: row.try_get("ui_language")?,
        two_factor: TwoFactorState {
            enabled: row.try_get::<i64, _>("totp_enabled")? != 0,
            secret: row.try_get("totp_secret")?,
            setup_at: row.try_get("totp_setup_at")?,
            backup_code_hashes,
            used_backup_code_hashes,
        },
        failed_login_attempts: row.try_get("failed_login_attempts")?,
        last_failed_login: row.try_get("last_failed_login")?,
        locked_until: row.try_get("locked_until")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl Store {
    /// Create a new user. Fails with [`StoreError::AlreadyExists`] if the
    /// username is taken.
    pub async fn create_user(&self, user: &User) -> StoreResult<()> {
        let roles: Vec<&str> = user.roles.iter().map(|r| r.as_str()).collect();
        let roles_json = serde_json::to_string(&roles).unwrap_or_else(|_| "[]".to_owned());
        let policies_json = serde_json::to_string(&user.policies).unwrap_or_else(|_| "[]".to_owned());
        let metadata_json = serde_json::to_string(&user.metadata).unwrap_or_else(|_| "{}".to_owned());
        let backup_codes_json =
            serde_json::to_string(&user.two_factor.backup_code_hashes).unwrap_or_else(|_| "[]".to_owned());
        let used_codes_json =
            serde_json::to_string(&user.two_factor.used_backup_code_hashes).unwrap_or_else(|_| "[]".to_owned());

        sqlx::query(
            "INSERT INTO users
                (user_id, username, password_hash, display_name, email, status, tenant_id,
                 roles, policies, metadata, ui_theme, ui_language, totp_enabled, totp_secret,
                 totp_setup_at, backup_code_hashes, used_backup_code_hashes,
                 failed_login_attempts, last_failed_login, locked_until, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.user_id.to_string())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(status_str(user.status))
        .bind(user.tenant_id.as_ref().map(ToString::to_string))
        .bind(roles_json)
        .bind(policies_json)
        .bind(metadata_json)
        .bind(&user.ui_theme)
        .bind(&user.ui_language)
        .bind(i64::from(user.two_factor.enabled))
        .bind(&user.two_factor.secret)
        .bind(user.two_factor.setup_at)
        .bind(backup_codes_json)
        .bind(used_codes_json)
        .bind(user.failed_login_attempts)
        .bind(user.last_failed_login)
        .bind(user.locked_until)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a user by id.
    pub async fn get_user(&self, user_id: &UserId) -> StoreResult<User> {
        let row = sqlx::query("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;

        row_to_user(&row)
    }

    /// Fetch a user by its unique username.
    pub async fn get_user_by_username(&self, username: &str) -> StoreResult<User> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ? AND status != 'deleted'")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {username}")))?;

        row_to_user(&row)
    }

    /// List non-deleted users, optionally scoped to a tenant.
    pub async fn list_users(&self, tenant_id: Option<&TenantId>) -> StoreResult<Vec<User>> {
        let rows = match tenant_id {
            Some(tid) => {
                sqlx::query("SELECT * FROM users WHERE tenant_id = ? AND status != 'deleted' ORDER BY created_at")
                    .bind(tid.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM users WHERE status != 'deleted' ORDER BY created_at")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(row_to_user).collect()
    }

    /// Update a user's mutable attributes (not lockout or 2FA state — use
    /// the dedicated operations for those).
    pub async fn update_user(&self, user: &User) -> StoreResult<()> {
        let roles: Vec<&str> = user.roles.iter().map(|r| r.as_str()).collect();
        let roles_json = serde_json::to_string(&roles).unwrap_or_else(|_| "[]".to_owned());
        let policies_json = serde_json::to_string(&user.policies).unwrap_or_else(|_| "[]".to_owned());
        let metadata_json = serde_json::to_string(&user.metadata).unwrap_or_else(|_| "{}".to_owned());

        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, display_name = ?, email = ?, status = ?,
                roles = ?, policies = ?, metadata = ?, ui_theme = ?, ui_language = ?, updated_at = ?
             WHERE user_id = ?",
        )
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(status_str(user.status))
        .bind(roles_json)
        .bind(policies_json)
        .bind(metadata_json)
        .bind(&user.ui_theme)
        .bind(&user.ui_language)
        .bind(user.updated_at)
        .bind(user.user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {}", user.user_id)));
        }
        Ok(())
    }

    /// Tombstone a user and cascade to their access keys, in one transaction.
    ///
    /// Refusal to delete the reserved `admin` id is enforced by the caller
    /// (the auth manager), not here — the store performs whatever it is told.
    pub async fn delete_user(&self, user_id: &UserId, now: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE access_keys SET status = 'deleted' WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("UPDATE users SET status = 'deleted', updated_at = ? WHERE user_id = ?")
            .bind(now)
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }

        tx.commit().await?;
        Ok(())
    }

    // --- Lockout -----------------------------------------------------------

    /// Atomically increment a user's failed-login counter and return the new count.
    pub async fn increment_failed_login_attempts(&self, user_id: &UserId, now: i64) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET failed_login_attempts = failed_login_attempts + 1, last_failed_login = ? WHERE user_id = ?")
            .bind(now)
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query("SELECT failed_login_attempts FROM users WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;

        tx.commit().await?;
        Ok(row.try_get("failed_login_attempts")?)
    }

    /// Lock an account until `now + duration_seconds`, resetting the failed-attempt counter.
    pub async fn lock_account(&self, user_id: &UserId, duration_seconds: i64, now: i64) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET locked_until = ?, failed_login_attempts = 0, updated_at = ? WHERE user_id = ?",
        )
        .bind(now + duration_seconds)
        .bind(now)
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    /// Clear a lock and reset the failed-attempt counter.
    pub async fn unlock_account(&self, user_id: &UserId, now: i64) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET locked_until = 0, failed_login_attempts = 0, updated_at = ? WHERE user_id = ?",
        )
        .bind(now)
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    /// Reset the failed-login counter without touching the lock.
    pub async fn reset_failed_login_attempts(&self, user_id: &UserId) -> StoreResult<()> {
        sqlx::query("UPDATE users SET failed_login_attempts = 0 WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Read `(failed_login_attempts, locked_until)` for a user.
    pub async fn get_account_lock_status(&self, user_id: &UserId) -> StoreResult<(i64, i64)> {
        let row = sqlx::query("SELECT failed_login_attempts, locked_until FROM users WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;

        Ok((row.try_get("failed_login_attempts")?, row.try_get("locked_until")?))
    }

    // --- 2FA -----------------------------------------------------------------

    /// Enable 2FA: set the flag, secret, setup timestamp, and backup codes; clears the used list.
    pub async fn enable_2fa(&self, user_id: &UserId, secret: &str, hashed_backup_codes: &[String], now: i64) -> StoreResult<()> {
        let codes_json = serde_json::to_string(hashed_backup_codes).unwrap_or_else(|_| "[]".to_owned());

        let result = sqlx::query(
            "UPDATE users SET totp_enabled = 1, totp_secret = ?, totp_setup_at = ?,
                backup_code_hashes = ?, used_backup_code_hashes = '[]', updated_at = ?
             WHERE user_id = ?",
        )
        .bind(secret)
        .bind(now)
        .bind(codes_json)
        .bind(now)
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    /// Disable 2FA, nulling every 2FA field.
    pub async fn disable_2fa(&self, user_id: &UserId, now: i64) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET totp_enabled = 0, totp_secret = NULL, totp_setup_at = NULL,
                backup_code_hashes = '[]', used_backup_code_hashes = '[]', updated_at = ?
             WHERE user_id = ?",
        )
        .bind(now)
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    /// Append a backup code's hash to the used list.
    pub async fn mark_backup_code_used(&self, user_id: &UserId, code_hash: &str) -> StoreResult<()> {
        let user = self.get_user(user_id).await?;
        let mut used = user.two_factor.used_backup_code_hashes;
        used.push(code_hash.to_owned());
        let used_json = serde_json::to_string(&used).unwrap_or_else(|_| "[]".to_owned());

        sqlx::query("UPDATE users SET used_backup_code_hashes = ? WHERE user_id = ?")
            .bind(used_json)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace a user's backup-code hashes and clear the used list.
    pub async fn update_backup_codes(&self, user_id: &UserId, hashed_codes: &[String]) -> StoreResult<()> {
        let codes_json = serde_json::to_string(hashed_codes).unwrap_or_else(|_| "[]".to_owned());

        let result = sqlx::query(
            "UPDATE users SET backup_code_hashes = ?, used_backup_code_hashes = '[]' WHERE user_id = ?",
        )
        .bind(codes_json)
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_store;

    fn sample_user() -> User {
        User {
            user_id: UserId::new(),
            username: "alice".to_owned(),
            password_hash: "hash".to_owned(),
            display_name: "Alice".to_owned(),
            email: "alice@example.com".to_owned(),
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
    async fn test_should_create_and_fetch_user_by_username() {
        let store = test_store().await;
        let user = sample_user();
        store.create_user(&user).await.unwrap();

        let fetched = store.get_user_by_username("alice").await.unwrap();
        assert_eq!(fetched.user_id, user.user_id);
        assert_eq!(fetched.roles, vec![Role::Member]);
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_username() {
        let store = test_store().await;
        let user = sample_user();
        store.create_user(&user).await.unwrap();

        let mut dup = sample_user();
        dup.user_id = UserId::new();
        let result = store.create_user(&dup).await;
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_should_lock_and_unlock_account() {
        let store = test_store().await;
        let user = sample_user();
        store.create_user(&user).await.unwrap();

        store.lock_account(&user.user_id, 900, 1_000).await.unwrap();
        let (attempts, locked_until) = store.get_account_lock_status(&user.user_id).await.unwrap();
        assert_eq!(attempts, 0);
        assert_eq!(locked_until, 1_900);

        store.unlock_account(&user.user_id, 2_000).await.unwrap();
        let (_, locked_until) = store.get_account_lock_status(&user.user_id).await.unwrap();
        assert_eq!(locked_until, 0);
    }

    #[tokio::test]
    async fn test_should_increment_failed_login_attempts() {
        let store = test_store().await;
        let user = sample_user();
        store.create_user(&user).await.unwrap();

        let count = store.increment_failed_login_attempts(&user.user_id, 100).await.unwrap();
        assert_eq!(count, 1);
        let count = store.increment_failed_login_attempts(&user.user_id, 101).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_should_enable_and_disable_2fa() {
        let store = test_store().await;
        let user = sample_user();
        store.create_user(&user).await.unwrap();

        store.enable_2fa(&user.user_id, "base32secret", &["h1".to_owned(), "h2".to_owned()], 10).await.unwrap();
        let fetched = store.get_user(&user.user_id).await.unwrap();
        assert!(fetched.two_factor.enabled);
        assert_eq!(fetched.two_factor.secret.as_deref(), Some("base32secret"));
        assert_eq!(fetched.two_factor.backup_code_hashes.len(), 2);

        store.disable_2fa(&user.user_id, 20).await.unwrap();
        let fetched = store.get_user(&user.user_id).await.unwrap();
        assert!(!fetched.two_factor.enabled);
        assert!(fetched.two_factor.secret.is_none());
    }

    #[tokio::test]
    async fn test_should_mark_backup_code_used_without_clearing_others() {
        let store = test_store().await;
        let user = sample_user();
        store.create_user(&user).await.unwrap();
        store.enable_2fa(&user.user_id, "secret", &["h1".to_owned(), "h2".to_owned()], 10).await.unwrap();

        store.mark_backup_code_used(&user.user_id, "h1").await.unwrap();
        let fetched = store.get_user(&user.user_id).await.unwrap();
        assert_eq!(fetched.two_factor.used_backup_code_hashes, vec!["h1".to_owned()]);
        assert_eq!(fetched.two_factor.backup_code_hashes.len(), 2);
    }

    #[tokio::test]
    async fn test_should_cascade_delete_user_to_access_keys() {
        let store = test_store().await;
        let user = sample_user();
        store.create_user(&user).await.unwrap();

        store.delete_user(&user.user_id, 5).await.unwrap();
        let fetched = store.get_user(&user.user_id).await.unwrap();
        assert_eq!(fetched.status, UserStatus::Deleted);
    }
}
