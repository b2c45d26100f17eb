//! Request timestamp skew checking and S3 action extraction.
//!
//! Both are policy helpers consumed by the auth manager rather than the
//! signature engine itself: skew checking happens after signature
//! verification succeeds, and action extraction feeds the authorization
//! decision, not the HMAC computation.

use chrono::{DateTime, NaiveDateTime, Utc};
use s3auth_core::AuthError;

const MAX_SKEW_SECONDS: i64 = 15 * 60;

/// Check that a request's `X-Amz-Date` (`YYYYMMDDTHHMMSSZ`) or `Date`
/// (RFC 1123) header is within ±15 minutes of `now`.
///
/// # Errors
///
/// Returns [`AuthError::TimestampSkew`] if both headers are unparseable or
/// the parsed time falls outside the allowed window.
pub fn check_timestamp_skew(
    x_amz_date: Option<&str>,
    date_header: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    let parsed = x_amz_date
        .and_then(parse_amz_date)
        .or_else(|| date_header.and_then(parse_rfc1123_date))
        .ok_or(AuthError::TimestampSkew)?;

    let skew = (now - parsed).num_seconds().abs();
    if skew > MAX_SKEW_SECONDS {
        return Err(AuthError::TimestampSkew);
    }

    Ok(())
}

fn parse_amz_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ")
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_rfc1123_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The S3 action implied by a request's method, path shape, and sub-resource
/// query flags. Opaque to the signature engine; consumed by authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum S3Action {
    /// Operations against the service root (e.g. `ListBuckets`).
    Root(&'static str),
    /// Operations against a bucket, optionally qualified by a sub-resource.
    Bucket(&'static str),
    /// Operations against an object within a bucket.
    Object(&'static str),
}

const SUB_RESOURCES: &[(&str, &str)] = &[
    ("versioning", "BucketVersioning"),
    ("policy", "BucketPolicy"),
    ("lifecycle", "BucketLifecycle"),
    ("cors", "BucketCors"),
    ("acl", "Acl"),
    ("tagging", "Tagging"),
    ("retention", "ObjectRetention"),
    ("legal-hold", "ObjectLegalHold"),
    ("uploadId", "MultipartUpload"),
];

/// Derive the S3 action for a request given its method, path, and query string.
#[must_use]
pub fn extract_s3_action(method: &str, path: &str, query: &str) -> S3Action {
    let segments: Vec<&str> = path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();

    let sub_resource = SUB_RESOURCES
        .iter()
        .find(|(key, _)| query.split('&').any(|p| p.split('=').next() == Some(*key)))
        .map(|(_, name)| *name);

    match segments.as_slice() {
        [] => S3Action::Root(match method {
            "GET" => "ListBuckets",
            _ => "Unknown",
        }),
        [_bucket] => {
            if let Some(name) = sub_resource {
                return S3Action::Bucket(name);
            }
            S3Action::Bucket(match method {
                "GET" => "ListObjects",
                "PUT" => "CreateBucket",
                "DELETE" => "DeleteBucket",
                "HEAD" => "HeadBucket",
                _ => "Unknown",
            })
        }
        [_bucket, ..] => {
            if let Some(name) = sub_resource {
                return S3Action::Object(name);
            }
            S3Action::Object(match method {
                "GET" => "GetObject",
                "PUT" => "PutObject",
                "DELETE" => "DeleteObject",
                "HEAD" => "HeadObject",
                "POST" => "PostObject",
                _ => "Unknown",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_should_accept_timestamp_within_window() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert!(check_timestamp_skew(Some("20240101T120500Z"), None, now).is_ok());
    }

    #[test]
    fn test_should_reject_timestamp_outside_window() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let result = check_timestamp_skew(Some("20240101T123001Z"), None, now);
        assert!(matches!(result, Err(AuthError::TimestampSkew)));
    }

    #[test]
    fn test_should_fall_back_to_date_header() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert!(check_timestamp_skew(None, Some("Mon, 01 Jan 2024 12:05:00 GMT"), now).is_ok());
    }

    #[test]
    fn test_should_reject_when_both_headers_missing() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert!(matches!(check_timestamp_skew(None, None, now), Err(AuthError::TimestampSkew)));
    }

    #[test]
    fn test_should_extract_root_action() {
        assert_eq!(extract_s3_action("GET", "/", ""), S3Action::Root("ListBuckets"));
    }

    #[test]
    fn test_should_extract_bucket_action() {
        assert_eq!(extract_s3_action("PUT", "/mybucket", ""), S3Action::Bucket("CreateBucket"));
    }

    #[test]
    fn test_should_extract_object_action() {
        assert_eq!(extract_s3_action("GET", "/mybucket/key.txt", ""), S3Action::Object("GetObject"));
    }

    #[test]
    fn test_should_extract_subresource_action_over_bucket_verb() {
        assert_eq!(
            extract_s3_action("GET", "/mybucket", "versioning="),
            S3Action::Bucket("BucketVersioning")
        );
    }
}
