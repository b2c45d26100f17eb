//! Session tokens.
//!
//! A compact three-segment token — base64url(header).base64url(claims).
//! base64url(HMAC-SHA256(secret, header.claims)) — is exactly the HS256 JWT
//! wire format, so this module is a thin domain wrapper over `jsonwebtoken`
//! rather than a hand-rolled reimplementation of the same construction.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use s3auth_core::AuthError;
use serde::{Deserialize, Serialize};

const ISSUER: &str = "s3auth";
const AUDIENCE: &str = "s3auth-console";

/// The claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// The authenticated user's id.
    pub user_id: String,
    /// The user's tenant, `None` for a global user.
    pub tenant_id: Option<String>,
    /// The username, carried as `access_key` for console tokens.
    pub access_key: String,
    /// The user's role tags, as strings.
    pub roles: Vec<String>,
    /// Expiry, Unix epoch seconds.
    pub exp: i64,
    /// Issued-at, Unix epoch seconds.
    pub iat: i64,
    /// Not-before, Unix epoch seconds.
    pub nbf: i64,
    /// Issuer.
    pub iss: String,
    /// Subject (the user id, repeated per JWT convention).
    pub sub: String,
    /// Audience.
    pub aud: String,
}

/// Issue a session token for `user_id`/`username`, valid for `ttl_seconds`
/// starting at `now` (Unix epoch seconds).
///
/// # Errors
///
/// Returns [`AuthError::Internal`] if token encoding fails.
pub fn issue(
    user_id: &str,
    tenant_id: Option<&str>,
    username: &str,
    roles: &[String],
    secret: &str,
    now: i64,
    ttl_seconds: i64,
) -> Result<String, AuthError> {
    let claims = SessionClaims {
        user_id: user_id.to_owned(),
        tenant_id: tenant_id.map(ToOwned::to_owned),
        access_key: username.to_owned(),
        roles: roles.to_vec(),
        exp: now + ttl_seconds,
        iat: now,
        nbf: now,
        iss: ISSUER.to_owned(),
        sub: user_id.to_owned(),
        aud: AUDIENCE.to_owned(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::Internal(e.into()))
}

/// Verify a session token's signature and expiry, returning its claims.
///
/// # Errors
///
/// Returns [`AuthError::TokenExpired`] if `exp` has passed, or
/// [`AuthError::InvalidToken`] for any other decoding or signature failure.
pub fn verify(token: &str, secret: &str) -> Result<SessionClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_audience(&[AUDIENCE]);

    decode::<SessionClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
}
