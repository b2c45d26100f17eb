//! Presigned URL detection.
//!
//! Presigned requests carry their authentication in query parameters
//! (`X-Amz-Algorithm`, `X-Amz-Credential`, `X-Amz-Signature`, or the SigV2
//! equivalents `AWSAccessKeyId`/`Signature`/`Expires`) rather than the
//! `Authorization` header. They bypass the auth middleware entirely and are
//! validated by the S3 handler against the object/bucket it is serving, so
//! this module only needs to recognize and route around them — the
//! signature recomputation that presigned verification requires lives with
//! that handler, not here.

/// Query parameter names that mark a request as presigned, under either scheme.
const PRESIGNED_MARKERS: &[&str] = &[
    "X-Amz-Algorithm",
    "X-Amz-Credential",
    "X-Amz-Signature",
    "AWSAccessKeyId",
    "Signature",
    "Expires",
];

/// Whether the query string carries presigned-URL authentication parameters.
#[must_use]
pub fn is_presigned_request(query: &str) -> bool {
    if query.is_empty() {
        return false;
    }

    query.split('&').any(|param| {
        let key = param.split('=').next().unwrap_or("");
        PRESIGNED_MARKERS
            .iter()
            .any(|marker| key.eq_ignore_ascii_case(marker))
    })
}
