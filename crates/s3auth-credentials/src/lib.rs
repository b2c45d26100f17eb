//! Password, access-key, TOTP, backup-code, and session-token primitives.
//!
//! This crate holds the stateless credential mechanics used by the auth
//! core: it never touches a store or a database connection. Callers
//! (the manager crate) own persistence and wire these primitives together
//! with policy.

pub mod backup_codes;
pub mod keys;
pub mod password;
pub mod session;
pub mod totp;

pub use backup_codes::{BACKUP_CODE_COUNT, BackupCodeCheck, check_code, generate_codes, has_backup_code_shape, hash_codes};
pub use keys::{generate_access_key_id, generate_secret_access_key};
pub use password::{VerifyOutcome, hash_password, legacy_sha256_hash, verify_password};
pub use session::{SessionClaims, issue as issue_session_token, verify as verify_session_token};
pub use totp::{Provisioned as TotpProvisioned, provision as provision_totp, verify as verify_totp};

pub use s3auth_core::{AuthError, AuthResult};
