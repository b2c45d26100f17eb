//! Schema establishment.
//!
//! The schema is created on first open. Later additive changes are applied
//! as `ALTER TABLE ... ADD COLUMN` statements that ignore a "duplicate
//! column" failure, so the same migration list is safe to re-run against an
//! already-current database.

use sqlx::SqlitePool;

use crate::error::StoreResult;

const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS tenants (
    tenant_id            TEXT PRIMARY KEY,
    name                 TEXT NOT NULL UNIQUE,
    display_name         TEXT NOT NULL,
    description          TEXT NOT NULL DEFAULT '',
    status               TEXT NOT NULL,
    max_access_keys      INTEGER NOT NULL DEFAULT 0,
    max_storage_bytes    INTEGER NOT NULL DEFAULT 0,
    max_buckets          INTEGER NOT NULL DEFAULT 0,
    current_storage_bytes INTEGER NOT NULL DEFAULT 0,
    current_buckets      INTEGER NOT NULL DEFAULT 0,
    metadata             TEXT NOT NULL DEFAULT '{}',
    created_at           INTEGER NOT NULL,
    updated_at           INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    user_id               TEXT PRIMARY KEY,
    username              TEXT NOT NULL UNIQUE,
    password_hash         TEXT NOT NULL,
    display_name          TEXT NOT NULL DEFAULT '',
    email                 TEXT NOT NULL DEFAULT '',
    status                TEXT NOT NULL,
    tenant_id             TEXT REFERENCES tenants(tenant_id),
    roles                 TEXT NOT NULL DEFAULT '[]',
    policies              TEXT NOT NULL DEFAULT '[]',
    metadata              TEXT NOT NULL DEFAULT '{}',
    ui_theme              TEXT NOT NULL DEFAULT 'light',
    ui_language           TEXT NOT NULL DEFAULT 'en',
    totp_enabled          INTEGER NOT NULL DEFAULT 0,
    totp_secret           TEXT,
    totp_setup_at         INTEGER,
    backup_code_hashes    TEXT NOT NULL DEFAULT '[]',
    used_backup_code_hashes TEXT NOT NULL DEFAULT '[]',
    failed_login_attempts INTEGER NOT NULL DEFAULT 0,
    last_failed_login     INTEGER,
    locked_until          INTEGER NOT NULL DEFAULT 0,
    created_at            INTEGER NOT NULL,
    updated_at            INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_tenant_id ON users(tenant_id);

CREATE TABLE IF NOT EXISTS access_keys (
    access_key_id    TEXT PRIMARY KEY,
    secret_access_key TEXT NOT NULL,
    user_id          TEXT NOT NULL REFERENCES users(user_id),
    status           TEXT NOT NULL,
    created_at       INTEGER NOT NULL,
    last_used        INTEGER
);

CREATE INDEX IF NOT EXISTS idx_access_keys_user_id ON access_keys(user_id);

CREATE TABLE IF NOT EXISTS bucket_permissions (
    permission_id TEXT PRIMARY KEY,
    bucket_name   TEXT NOT NULL,
    user_id       TEXT REFERENCES users(user_id),
    tenant_id     TEXT REFERENCES tenants(tenant_id),
    level         TEXT NOT NULL,
    granted_by    TEXT,
    granted_at    INTEGER NOT NULL,
    expires_at    INTEGER,
    CHECK ((user_id IS NULL) <> (tenant_id IS NULL))
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_bucket_permissions_user
    ON bucket_permissions(bucket_name, user_id) WHERE user_id IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS idx_bucket_permissions_tenant
    ON bucket_permissions(bucket_name, tenant_id) WHERE tenant_id IS NOT NULL;
";

/// Additive column migrations, applied in order. Each is tolerant of
/// already having been applied (SQLite reports a distinct error for a
/// duplicate column, which is swallowed here).
const ADD_COLUMN_MIGRATIONS: &[&str] = &[
    "ALTER TABLE users ADD COLUMN ui_theme TEXT NOT NULL DEFAULT 'light'",
    "ALTER TABLE users ADD COLUMN ui_language TEXT NOT NULL DEFAULT 'en'",
];

pub(crate) async fn establish(pool: &SqlitePool) -> StoreResult<()> {
    for statement in CREATE_TABLES.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement).execute(pool).await?;
    }

    for migration in ADD_COLUMN_MIGRATIONS {
        if let Err(err) = sqlx::query(migration).execute(pool).await {
            let message = err.to_string();
            if !message.contains("duplicate column name") {
                return Err(err.into());
            }
        }
    }

    Ok(())
}
