//! Core types, configuration, and error taxonomy shared by the auth/tenancy
//! components: the persistent store, the signature engine, credential
//! primitives, the rate limiter, the quota enforcer, and the auth manager
//! that composes them.

mod config;
mod error;
mod types;

pub use config::{
    AuthConfig, NoopSettingsProvider, SettingsProvider, lockout_duration_seconds,
    max_failed_attempts, ratelimit_login_per_minute,
};
pub use error::{AuthError, AuthResult};
pub use types::{
    AccessKey, AccessKeyStatus, BucketPermission, GrantPrincipal, Metadata, PermissionLevel,
    Role, Tenant, TenantId, TenantStatus, TwoFactorState, User, UserId, UserStatus,
};
