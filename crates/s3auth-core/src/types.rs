//! Domain types shared by the persistent store, the auth manager, and every
//! collaborator in between.
//!
//! Roles and grant principals are modeled as closed enums and metadata as a
//! real map rather than an opaque JSON blob threaded through every layer —
//! the wire format (a JSON column in the store) is still JSON, but the
//! in-process representation is strongly typed.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Free-form key-value metadata attached to a tenant or a user.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Opaque tenant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl TenantId {
    /// Generate a fresh, random tenant id.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Opaque user identifier. The singleton global admin always has id `"admin"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// The reserved id of the singleton global admin user.
    pub const ADMIN: &str = "admin";

    /// Generate a fresh, random user id.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The well-known global admin id.
    #[must_use]
    pub fn admin() -> Self {
        Self(Self::ADMIN.to_owned())
    }

    /// Whether this is the reserved global admin id.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle status of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    /// Normal operating state.
    Active,
    /// Temporarily disabled; logins and S3 requests for its users are rejected.
    Inactive,
    /// Tombstoned. Should not appear in listings.
    Deleted,
}

/// Lifecycle status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Normal operating state; may authenticate.
    Active,
    /// Administratively disabled.
    Inactive,
    /// Administratively suspended (distinct from `Inactive` for audit purposes).
    Suspended,
    /// Locked out after repeated failed logins. See [`crate::types::User::locked_until`].
    Locked,
    /// Tombstoned.
    Deleted,
}

/// Lifecycle status of an access key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKeyStatus {
    /// May authenticate S3 requests.
    Active,
    /// Temporarily disabled.
    Inactive,
    /// Tombstoned; any non-active status fails authentication.
    Deleted,
}

/// A role tag carried by a user. Closed enum per the reimplementation design
/// note rather than an open string, with [`Role::as_str`] round-tripping
/// through the store's JSON column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Global admin when the user's `tenant_id` is `None`, tenant admin otherwise.
    Admin,
    /// An ordinary authenticated principal with no elevated role.
    Member,
}

impl Role {
    /// String form used in the JSON-serialized roles column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read/write/admin permission level granted on a bucket.
///
/// Ordering is `Read < Write < Admin`, so `level >= PermissionLevel::Write`
/// is a valid way to ask "can this principal write".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// Read-only access.
    Read,
    /// Read-write access.
    Write,
    /// Full control, including granting access to others.
    Admin,
}

/// The grantee of a [`BucketPermission`]: exactly one user or one tenant,
/// never both and never neither. Modeled as an enum instead of two optional
/// fields so the XOR invariant is enforced by the type system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantPrincipal {
    /// The grant applies to a single user.
    User(UserId),
    /// The grant applies to every user in a tenant.
    Tenant(TenantId),
}

/// A tenant: the top-level multi-tenancy boundary owning users, quotas, and grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Opaque identifier.
    pub tenant_id: TenantId,
    /// Globally-unique name among non-deleted tenants.
    pub name: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Free-text description.
    pub description: String,
    /// Lifecycle status.
    pub status: TenantStatus,
    /// Maximum number of access keys across the tenant's users. `0` = unlimited.
    pub max_access_keys: i64,
    /// Maximum total storage bytes. `0` = unlimited.
    pub max_storage_bytes: i64,
    /// Maximum number of buckets. `0` = unlimited.
    pub max_buckets: i64,
    /// Live local storage usage counter. Never negative.
    pub current_storage_bytes: i64,
    /// Live local bucket count counter. Never negative.
    pub current_buckets: i64,
    /// Free-form metadata.
    pub metadata: Metadata,
    /// Creation time, Unix epoch seconds.
    pub created_at: i64,
    /// Last update time, Unix epoch seconds.
    pub updated_at: i64,
}

impl Tenant {
    /// A `max_storage_bytes` of `0` means "unlimited".
    #[must_use]
    pub fn storage_unlimited(&self) -> bool {
        self.max_storage_bytes == 0
    }

    /// A `max_buckets` of `0` means "unlimited".
    #[must_use]
    pub fn buckets_unlimited(&self) -> bool {
        self.max_buckets == 0
    }

    /// A `max_access_keys` of `0` means "unlimited".
    #[must_use]
    pub fn access_keys_unlimited(&self) -> bool {
        self.max_access_keys == 0
    }
}

/// Two-factor authentication state embedded in a [`User`].
///
/// `secret` and the code lists are never serialized to any external
/// interface; only the `enabled` flag and `setup_at` timestamp are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwoFactorState {
    /// Whether 2FA is currently enabled for this user.
    pub enabled: bool,
    /// Base32 TOTP secret. Internal only.
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    /// When 2FA was enabled, Unix epoch seconds.
    pub setup_at: Option<i64>,
    /// Bcrypt hashes of the 10 outstanding backup codes. Internal only.
    #[serde(skip_serializing)]
    pub backup_code_hashes: Vec<String>,
    /// Bcrypt hashes of backup codes already consumed. Internal only.
    #[serde(skip_serializing)]
    pub used_backup_code_hashes: Vec<String>,
}

/// A user (principal). `tenant_id == None` marks a global user; the
/// singleton global admin has id `"admin"`, `tenant_id: None`, and role
/// [`Role::Admin`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier; `"admin"` for the singleton global admin.
    pub user_id: UserId,
    /// Globally-unique username.
    pub username: String,
    /// Bcrypt hash, or (pre-migration accounts) a legacy SHA-256 hex digest —
    /// distinguished at verification time by whether bcrypt accepts the
    /// stored value as a valid hash, not by a separate flag. Never
    /// serialized to an external interface.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Lifecycle status.
    pub status: UserStatus,
    /// `None` for a global user.
    pub tenant_id: Option<TenantId>,
    /// Role tags.
    pub roles: Vec<Role>,
    /// Opaque policy tags, evaluated by a future policy component.
    pub policies: Vec<String>,
    /// Free-form metadata.
    pub metadata: Metadata,
    /// UI theme preference.
    pub ui_theme: String,
    /// UI language preference.
    pub ui_language: String,
    /// Two-factor authentication state.
    pub two_factor: TwoFactorState,
    /// Consecutive failed login attempts since the last reset.
    pub failed_login_attempts: i64,
    /// Timestamp of the last failed login, Unix epoch seconds. Best-effort.
    pub last_failed_login: Option<i64>,
    /// Unix epoch seconds until which the account is locked. `0` = not locked.
    pub locked_until: i64,
    /// Creation time, Unix epoch seconds.
    pub created_at: i64,
    /// Last update time, Unix epoch seconds.
    pub updated_at: i64,
}

impl User {
    /// Whether this user is the singleton global admin.
    #[must_use]
    pub fn is_global_admin(&self) -> bool {
        self.user_id.is_admin() && self.tenant_id.is_none() && self.roles.contains(&Role::Admin)
    }

    /// Whether this user is a tenant admin (role `admin`, non-null tenant).
    #[must_use]
    pub fn is_tenant_admin(&self) -> bool {
        self.tenant_id.is_some() && self.roles.contains(&Role::Admin)
    }
}

/// An AWS-compatible access key pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessKey {
    /// `AKIA` followed by 16 uppercase alphanumerics (20 chars total).
    pub access_key_id: String,
    /// 40 base64 characters over 30 random bytes.
    ///
    /// Stored in recoverable form (not hashed): SigV4/SigV2 verification
    /// must re-derive the exact HMAC chain the client used, which requires
    /// the plaintext secret.
    pub secret_access_key: String,
    /// The user that owns this key.
    pub user_id: UserId,
    /// Lifecycle status.
    pub status: AccessKeyStatus,
    /// Creation time, Unix epoch seconds.
    pub created_at: i64,
    /// Last successful-verification time, Unix epoch seconds. Best-effort.
    pub last_used: Option<i64>,
}

/// An explicit bucket permission grant to a user or a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketPermission {
    /// Opaque identifier.
    pub permission_id: String,
    /// The bucket this grant applies to.
    pub bucket_name: String,
    /// Exactly one of user or tenant.
    pub principal: GrantPrincipal,
    /// The permission level granted.
    pub level: PermissionLevel,
    /// The user that created this grant, if known.
    pub granted_by: Option<UserId>,
    /// Grant creation time, Unix epoch seconds.
    pub granted_at: i64,
    /// Optional expiry; an expired grant is treated as absent.
    pub expires_at: Option<i64>,
}

impl BucketPermission {
    /// Whether this grant is still live at `now` (Unix epoch seconds).
    #[must_use]
    pub fn is_active(&self, now: i64) -> bool {
        self.expires_at.is_none_or(|exp| exp > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_generate_unique_tenant_ids() {
        assert_ne!(TenantId::new(), TenantId::new());
    }

    #[test]
    fn test_should_recognize_admin_user_id() {
        assert!(UserId::admin().is_admin());
        assert!(!UserId::new().is_admin());
    }

    #[test]
    fn test_should_order_permission_levels() {
        assert!(PermissionLevel::Admin > PermissionLevel::Write);
        assert!(PermissionLevel::Write > PermissionLevel::Read);
    }

    #[test]
    fn test_should_treat_zero_quota_as_unlimited() {
        let tenant = Tenant {
            tenant_id: TenantId::new(),
            name: "acme".to_owned(),
            display_name: "Acme".to_owned(),
            description: String::new(),
            status: TenantStatus::Active,
            max_access_keys: 0,
            max_storage_bytes: 0,
            max_buckets: 0,
            current_storage_bytes: 0,
            current_buckets: 0,
            metadata: Metadata::new(),
            created_at: 0,
            updated_at: 0,
        };
        assert!(tenant.storage_unlimited());
        assert!(tenant.buckets_unlimited());
        assert!(tenant.access_keys_unlimited());
    }

    #[test]
    fn test_should_treat_expired_grant_as_inactive() {
        let grant = BucketPermission {
            permission_id: "p1".to_owned(),
            bucket_name: "b1".to_owned(),
            principal: GrantPrincipal::User(UserId::new()),
            level: PermissionLevel::Read,
            granted_by: None,
            granted_at: 0,
            expires_at: Some(100),
        };
        assert!(grant.is_active(50));
        assert!(!grant.is_active(150));
    }
}
