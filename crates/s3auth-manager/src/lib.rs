//! The composed authentication, authorization, and tenancy operations.
//!
//! [`AuthManager`] is the single entry point external callers use: console
//! login, SigV4/SigV2 request verification, JWT sessions, 2FA, and the
//! CRUD/lifecycle operations over users, tenants, access keys, and bucket
//! grants. It composes the lower-level crates (`s3auth-credentials`,
//! `s3auth-signature`, `s3auth-store`, `s3auth-ratelimit`, `s3auth-quota`)
//! rather than reimplementing any of their mechanics.

mod access_keys;
pub mod audit;
mod authz;
mod credentials;
mod grants;
mod login;
mod manager;
mod middleware;
mod session;
mod tenants;
mod twofa;
mod users;

pub use audit::{AuditEvent, AuditSink, TracingAuditSink};
pub use credentials::S3RequestParts;
pub use manager::AuthManager;
