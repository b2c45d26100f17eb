//! Error taxonomy for the auth/tenancy core.
//!
//! Variants are grouped, per the design note, into input errors (malformed
//! or unverifiable credentials, surfaced as 401/403 S3-XML), state errors
//! (403/404/409 depending on context), store errors (propagated; a
//! transaction conflict may be retried once by the caller), and
//! configuration errors (fail startup).

/// Core error type for the auth/tenancy components.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    // --- Input errors ---------------------------------------------------
    /// No `Authorization` header and no other credential present.
    #[error("missing signature")]
    MissingSignature,

    /// The computed signature does not match the one supplied by the client.
    #[error("signature does not match")]
    InvalidSignature,

    /// A session token failed signature verification or decoding.
    #[error("invalid token")]
    InvalidToken,

    /// A session token's expiry has passed.
    #[error("token expired")]
    TokenExpired,

    /// The request timestamp is outside the allowed clock-skew window.
    #[error("timestamp skew too large")]
    TimestampSkew,

    /// Username/password, access key, or TOTP/backup code did not verify.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The `Authorization` header (or query-string signature) could not be parsed.
    #[error("malformed signature header: {0}")]
    MalformedSignatureHeader(String),

    // --- State errors -----------------------------------------------------
    /// No user with the given id or username.
    #[error("user not found")]
    UserNotFound,

    /// No tenant with the given id or name.
    #[error("tenant not found")]
    TenantNotFound,

    /// No access key with the given id.
    #[error("access key not found")]
    AccessKeyNotFound,

    /// The user exists but is not in an active state.
    #[error("user is not active")]
    UserInactive,

    /// The account is locked out following repeated failed logins.
    #[error("account is locked")]
    AccountLocked,

    /// The per-IP login rate limiter rejected this attempt.
    #[error("rate limit exceeded")]
    RateLimited,

    /// The caller's role or grants do not permit the requested operation.
    #[error("access denied")]
    AccessDenied,

    /// A tenant or user quota would be exceeded by the requested operation.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// A unique constraint (username, tenant name, access key id) was violated.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A delete was rejected because the target still has dependents.
    #[error("not empty: {0}")]
    NotEmpty(String),

    // --- Store errors -----------------------------------------------------
    /// An unclassified persistence-layer failure.
    #[error("store error: {0}")]
    StoreError(String),

    /// A non-uniqueness constraint was violated (foreign key, check constraint).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// The underlying transaction was aborted by a conflicting writer; safe to retry once.
    #[error("transaction conflict, retry")]
    TransactionConflict,

    // --- Configuration errors ----------------------------------------------
    /// Configuration could not be loaded or was invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with arbitrary context, for failures that don't fit
    /// an existing variant.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Whether the caller may safely retry the operation once.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::TransactionConflict)
    }

    /// The S3-style error code used in the `<Code>` element of the XML body.
    #[must_use]
    pub fn s3_code(&self) -> &'static str {
        match self {
            AuthError::MissingSignature => "MissingSecurityHeader",
            AuthError::InvalidSignature => "SignatureDoesNotMatch",
            AuthError::InvalidToken | AuthError::TokenExpired => "InvalidToken",
            AuthError::TimestampSkew => "RequestTimeTooSkewed",
            AuthError::InvalidCredentials | AuthError::AccessKeyNotFound => {
                "InvalidAccessKeyId"
            }
            AuthError::MalformedSignatureHeader(_) => "AuthorizationHeaderMalformed",
            AuthError::UserNotFound | AuthError::TenantNotFound => "NoSuchUser",
            AuthError::UserInactive | AuthError::AccountLocked | AuthError::AccessDenied => {
                "AccessDenied"
            }
            AuthError::RateLimited => "SlowDown",
            AuthError::QuotaExceeded(_) => "QuotaExceeded",
            AuthError::AlreadyExists(_) => "BucketAlreadyExists",
            AuthError::NotEmpty(_) => "TenantNotEmpty",
            AuthError::StoreError(_)
            | AuthError::ConstraintViolation(_)
            | AuthError::TransactionConflict
            | AuthError::Config(_)
            | AuthError::Internal(_) => "InternalError",
        }
    }

    /// The HTTP status that should accompany [`AuthError::s3_code`].
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            AuthError::MissingSignature
            | AuthError::InvalidSignature
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::TimestampSkew
            | AuthError::InvalidCredentials
            | AuthError::MalformedSignatureHeader(_)
            | AuthError::AccessKeyNotFound => 401,
            AuthError::UserInactive | AuthError::AccountLocked | AuthError::AccessDenied => 403,
            AuthError::RateLimited => 503,
            AuthError::UserNotFound | AuthError::TenantNotFound => 404,
            AuthError::AlreadyExists(_) | AuthError::NotEmpty(_) | AuthError::QuotaExceeded(_) => {
                409
            }
            AuthError::StoreError(_)
            | AuthError::ConstraintViolation(_)
            | AuthError::TransactionConflict
            | AuthError::Config(_)
            | AuthError::Internal(_) => 500,
        }
    }
}

/// Convenience result type for auth/tenancy operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_mark_only_transaction_conflict_as_retryable() {
        assert!(AuthError::TransactionConflict.is_retryable());
        assert!(!AuthError::StoreError("x".into()).is_retryable());
    }

    #[test]
    fn test_should_map_invalid_signature_to_401() {
        assert_eq!(AuthError::InvalidSignature.http_status(), 401);
        assert_eq!(AuthError::InvalidSignature.s3_code(), "SignatureDoesNotMatch");
    }

    #[test]
    fn test_should_map_quota_exceeded_to_409() {
        assert_eq!(AuthError::QuotaExceeded("over".into()).http_status(), 409);
    }
}
