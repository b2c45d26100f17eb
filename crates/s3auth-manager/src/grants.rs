//! Bucket grant CRUD. Thin delegation to the store; the interesting policy
//! logic lives in [`crate::authz`].

use s3auth_core::{AuthResult, BucketPermission, PermissionLevel, UserId};

use crate::AuthManager;

impl AuthManager {
    /// Create or replace a bucket grant.
    pub async fn upsert_bucket_grant(&self, grant: &BucketPermission) -> AuthResult<()> {
        Ok(self.store.upsert_bucket_grant(grant).await?)
    }

    /// Delete a bucket grant by id.
    pub async fn delete_bucket_grant(&self, permission_id: &str) -> AuthResult<()> {
        Ok(self.store.delete_bucket_grant(permission_id).await?)
    }

    /// List every grant on a bucket.
    pub async fn list_bucket_grants(&self, bucket_name: &str) -> AuthResult<Vec<BucketPermission>> {
        Ok(self.store.list_bucket_grants(bucket_name).await?)
    }

    /// Resolve whether `user_id` has access to `bucket_name` via an
    /// explicit user or tenant-inherited grant, and at what level.
    pub async fn check_bucket_access(
        &self,
        bucket_name: &str,
        user_id: &UserId,
        now: i64,
    ) -> AuthResult<(bool, Option<PermissionLevel>)> {
        Ok(self.store.check_bucket_access(bucket_name, user_id, now).await?)
    }
}
