//! Bucket permission grants and the cross-entity access check.

use s3auth_core::{BucketPermission, GrantPrincipal, PermissionLevel, TenantId, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::error::{StoreError, StoreResult};
use crate::store::Store;

fn level_str(level: PermissionLevel) -> &'static str {
    match level {
        PermissionLevel::Read => "read",
        PermissionLevel::Write => "write",
        PermissionLevel::Admin => "admin",
    }
}

fn parse_level(raw: &str) -> PermissionLevel {
    match raw {
        "write" => PermissionLevel::Write,
        "admin" => PermissionLevel::Admin,
        _ => PermissionLevel::Read,
    }
}

fn row_to_grant(row: &SqliteRow) -> StoreResult<BucketPermission> {
    let user_id: Option<String> = row.try_get("user_id")?;
    let tenant_id: Option<String> = row.try_get("tenant_id")?;
    let level_raw: String = row.try_get("level")?;
    let granted_by: Option<String> = row.try_get("granted_by")?;

    let principal = match (user_id, tenant_id) {
        (Some(u), None) => GrantPrincipal::User(UserId(u)),
        (None, Some(t)) => GrantPrincipal::Tenant(TenantId(t)),
        _ => return Err(StoreError::ConstraintViolation("grant missing exactly one principal".to_owned())),
    };

    Ok(BucketPermission {
        permission_id: row.try_get("permission_id")?,
        bucket_name: row.try_get("bucket_name")?,
        principal,
        level: parse_level(&level_raw),
        granted_by: granted_by.map(UserId),
        granted_at: row.try_get("granted_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

impl Store {
    /// Upsert a grant: at most one row per `(bucket, user)` or `(bucket,
    /// tenant)` pair — a reinsert for the same pair replaces it in place.
    pub async fn upsert_bucket_grant(&self, grant: &BucketPermission) -> StoreResult<()> {
        let (user_id, tenant_id) = match &grant.principal {
            GrantPrincipal::User(u) => (Some(u.to_string()), None),
            GrantPrincipal::Tenant(t) => (None, Some(t.to_string())),
        };

        let existing = match &grant.principal {
            GrantPrincipal::User(u) => {
                sqlx::query("SELECT permission_id FROM bucket_permissions WHERE bucket_name = ? AND user_id = ?")
                    .bind(&grant.bucket_name)
                    .bind(u.to_string())
                    .fetch_optional(&self.pool)
                    .await?
            }
            GrantPrincipal::Tenant(t) => {
                sqlx::query("SELECT permission_id FROM bucket_permissions WHERE bucket_name = ? AND tenant_id = ?")
                    .bind(&grant.bucket_name)
                    .bind(t.to_string())
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        if let Some(row) = existing {
            let permission_id: String = row.try_get("permission_id")?;
            sqlx::query(
                "UPDATE bucket_permissions SET level = ?, granted_by = ?, granted_at = ?, expires_at = ?
                 WHERE permission_id = ?",
            )
            .bind(level_str(grant.level))
            .bind(grant.granted_by.as_ref().map(ToString::to_string))
            .bind(grant.granted_at)
            .bind(grant.expires_at)
            .bind(permission_id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "INSERT INTO bucket_permissions
                    (permission_id, bucket_name, user_id, tenant_id, level, granted_by, granted_at, expires_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&grant.permission_id)
            .bind(&grant.bucket_name)
            .bind(user_id)
            .bind(tenant_id)
            .bind(level_str(grant.level))
            .bind(grant.granted_by.as_ref().map(ToString::to_string))
            .bind(grant.granted_at)
            .bind(grant.expires_at)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// Remove a grant by id.
    pub async fn delete_bucket_grant(&self, permission_id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM bucket_permissions WHERE permission_id = ?")
            .bind(permission_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("grant {permission_id}")));
        }
        Ok(())
    }

    /// List every grant on a bucket.
    pub async fn list_bucket_grants(&self, bucket_name: &str) -> StoreResult<Vec<BucketPermission>> {
        let rows = sqlx::query("SELECT * FROM bucket_permissions WHERE bucket_name = ?")
            .bind(bucket_name)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_grant).collect()
    }

    /// Resolve whether `user_id` may access `bucket_name`.
    ///
    /// Consults the user-level grant first; if absent, loads the user's
    /// tenant and consults the tenant-level grant. Expired rows are treated
    /// as absent at both levels.
    pub async fn check_bucket_access(&self, bucket_name: &str, user_id: &UserId, now: i64) -> StoreResult<(bool, Option<PermissionLevel>)> {
        let user_grant = sqlx::query("SELECT * FROM bucket_permissions WHERE bucket_name = ? AND user_id = ?")
            .bind(bucket_name)
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = user_grant {
            let grant = row_to_grant(&row)?;
            if grant.is_active(now) {
                return Ok((true, Some(grant.level)));
            }
        }

        let user_row = sqlx::query("SELECT tenant_id FROM users WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(user_row) = user_row else {
            return Ok((false, None));
        };

        let tenant_id: Option<String> = user_row.try_get("tenant_id")?;
        let Some(tenant_id) = tenant_id else {
            return Ok((false, None));
        };

        let tenant_grant = sqlx::query("SELECT * FROM bucket_permissions WHERE bucket_name = ? AND tenant_id = ?")
            .bind(bucket_name)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        match tenant_grant {
            Some(row) => {
                let grant = row_to_grant(&row)?;
                if grant.is_active(now) {
                    Ok((true, Some(grant.level)))
                } else {
                    Ok((false, None))
                }
            }
            None => Ok((false, None)),
        }
    }
}
