//! Contract helpers for the HTTP middleware layer that sits in front of
//! [`AuthManager`]: which requests bypass auth entirely, and how to reject
//! one that carries a malformed or invalid `Authorization` header.

use s3auth_signature::is_presigned_request;

use crate::AuthManager;

const PUBLIC_ROUTE_PREFIXES: &[&str] = &["/auth/login", "/auth/register", "/health"];

impl AuthManager {
    /// Whether `path` is a public route that bypasses auth middleware entirely.
    #[must_use]
    pub fn is_public_route(&self, path: &str) -> bool {
        PUBLIC_ROUTE_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
    }

    /// Whether `query` marks this as a presigned-URL request, which bypasses
    /// middleware and is validated directly by the S3 handler instead.
    #[must_use]
    pub fn is_presigned_bypass(&self, query: &str) -> bool {
        is_presigned_request(query)
    }

    /// Build the S3-XML rejection body and status for a malformed or
    /// invalid `Authorization` header, as the middleware should return it.
    #[must_use]
    pub fn reject_invalid_authorization(&self, resource: &str, request_id: &str) -> (u16, Vec<u8>) {
        let body = s3auth_xml::error_to_xml("InvalidAccessKeyId", "The AWS access key or signature is invalid", Some(resource), request_id);
        (401, body)
    }
}
