//! Legacy AWS Signature Version 2 verification.
//!
//! The `Authorization` header has the format `AWS <AccessKeyId>:<Signature>`,
//! where `Signature = base64(HMAC-SHA256(SecretKey, StringToSign))` and:
//!
//! ```text
//! StringToSign = HTTP-Verb + "\n" +
//!                Content-MD5 + "\n" +
//!                Content-Type + "\n" +
//!                Date + "\n" +
//!                CanonicalizedResource
//! ```
//!
//! Note: canonical SigV2 signs with HMAC-SHA1; this deployment signs with
//! HMAC-SHA256 instead — an intentional hardening choice carried forward
//! rather than reverted, see the design notes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, KeyInit, Mac};
use s3auth_core::AuthError;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::sigv4::SignatureIdentity;

type HmacSha256 = Hmac<Sha256>;

/// Whether an `Authorization` header value uses the SigV2 format (`AWS AKID:sig`).
#[must_use]
pub fn is_sigv2(auth_header: &str) -> bool {
    auth_header.starts_with("AWS ") && !auth_header.starts_with("AWS4-")
}

/// The caller-supplied shape of a SigV2-signed request.
#[derive(Debug, Clone, Copy)]
pub struct RequestParts<'a> {
    /// HTTP method.
    pub method: &'a str,
    /// Request path, used verbatim as the canonical resource.
    pub path: &'a str,
    /// `Authorization` header value.
    pub authorization: &'a str,
    /// `Content-MD5` header value, if present.
    pub content_md5: &'a str,
    /// `Content-Type` header value, if present.
    pub content_type: &'a str,
    /// `Date` header value, if present.
    pub date: &'a str,
}

/// Verify a SigV2-signed request against a candidate secret key.
///
/// # Errors
///
/// Returns [`AuthError::MalformedSignatureHeader`] if the header cannot be
/// parsed, or [`AuthError::InvalidSignature`] if the recomputed signature
/// does not match.
pub fn verify_sigv2(request: RequestParts<'_>, secret_key: &str) -> Result<SignatureIdentity, AuthError> {
    let (access_key_id, provided_signature) = parse_sigv2_header(request.authorization)?;

    debug!(access_key_id = %access_key_id, "verifying sigv2 signature");

    let string_to_sign = build_string_to_sign(&request);
    let expected_signature = compute_sigv2_signature(secret_key, &string_to_sign);

    if provided_signature
        .as_bytes()
        .ct_eq(expected_signature.as_bytes())
        .into()
    {
        Ok(SignatureIdentity {
            access_key_id,
            region: String::new(),
            service: "s3".to_owned(),
            signed_headers: Vec::new(),
        })
    } else {
        Err(AuthError::InvalidSignature)
    }
}

fn parse_sigv2_header(header: &str) -> Result<(String, String), AuthError> {
    let rest = header
        .strip_prefix("AWS ")
        .ok_or_else(|| AuthError::MalformedSignatureHeader("missing AWS prefix".to_owned()))?;

    let (access_key_id, signature) = rest
        .split_once(':')
        .ok_or_else(|| AuthError::MalformedSignatureHeader("missing ':' separator".to_owned()))?;

    if access_key_id.is_empty() || signature.is_empty() {
        return Err(AuthError::MalformedSignatureHeader("empty key or signature".to_owned()));
    }

    Ok((access_key_id.to_owned(), signature.to_owned()))
}

fn build_string_to_sign(request: &RequestParts<'_>) -> String {
    let resource = if request.path.is_empty() { "/" } else { request.path };
    format!(
        "{}\n{}\n{}\n{}\n{resource}",
        request.method, request.content_md5, request.content_type, request.date
    )
}

fn compute_sigv2_signature(secret_key: &str, string_to_sign: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(string_to_sign.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}
