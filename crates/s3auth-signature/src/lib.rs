//! AWS Signature Version 2 and 4 request verification.
//!
//! This crate is the protocol-exact layer: given the pieces of an incoming
//! HTTP request and a *candidate* secret key, it recomputes the signature
//! the client should have produced and compares constant-time. It never
//! resolves an access key to a secret itself — that lookup, and everything
//! that follows a successful verification (loading the owning user,
//! updating `last_used`, authorization), belongs to the auth manager.
//!
//! # Modules
//!
//! - [`canonical`] - canonical request construction shared by SigV4 callers
//! - [`sigv4`] - header-based SigV4 verification (`AWS4-HMAC-SHA256`)
//! - [`sigv2`] - legacy header-based SigV2 verification
//! - [`presigned`] - presigned-URL bypass detection (verification itself
//!   is out of scope, owned by the S3 handler)
//! - [`timestamp`] - clock-skew enforcement and S3 action extraction

pub mod canonical;
pub mod presigned;
pub mod sigv2;
pub mod sigv4;
pub mod timestamp;

pub use presigned::is_presigned_request;
pub use sigv2::{is_sigv2, verify_sigv2};
pub use sigv4::{SignatureIdentity, hash_payload, verify_sigv4};
pub use timestamp::{S3Action, check_timestamp_skew, extract_s3_action};

pub use s3auth_core::{AuthError, AuthResult};
