//! Canonical request construction for AWS Signature Version 4.
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Each component is normalized per the AWS specification so two requests
//! that are semantically identical sign to the same canonical form.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters that must be percent-encoded in URI path segments and query
/// components. Unreserved: `A-Za-z0-9-_.~`. Forward slashes in the path are
/// preserved separately by the caller.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the full six-line canonical request string.
///
/// `host` is read from the request's resolved host, never from the header
/// map, matching the special case in the `host` signed-header rule.
#[must_use]
pub fn build_canonical_request(
    method: &str,
    canonical_uri: &str,
    query_string: &str,
    headers: &[(&str, &str)],
    signed_headers: &[&str],
    host: &str,
    payload_hash: &str,
) -> String {
    let canonical_query = build_canonical_query_string(query_string);
    let canonical_headers = build_canonical_headers(headers, signed_headers, host);
    let signed_headers_str = build_signed_headers_string(signed_headers);

    format!(
        "{}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n\n{signed_headers_str}\n{payload_hash}",
        method.to_uppercase()
    )
}

/// Build the canonical URI by re-encoding each path segment.
///
/// Forward slashes are preserved; an empty path normalizes to `/`. The
/// caller is responsible for supplying the *original* request path when an
/// upstream layer has rewritten virtual-hosted-style requests to
/// path-style — this function never second-guesses that input.
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    path.split('/')
        .map(|segment| uri_encode(&percent_decode_str(segment).decode_utf8_lossy()))
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the canonical query string.
///
/// Keys are percent-decoded then re-encoded, sorted lexicographically; for
/// duplicate keys, values are also sorted lexicographically. Emits
/// `url_encode(key)=url_encode(value)` pairs joined by `&`.
#[must_use]
pub fn build_canonical_query_string(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut params: Vec<(String, String)> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| {
            let (k, v) = param.split_once('=').unwrap_or((param, ""));
            (
                percent_decode_str(k).decode_utf8_lossy().into_owned(),
                percent_decode_str(v).decode_utf8_lossy().into_owned(),
            )
        })
        .collect();

    params.sort();

    params
        .iter()
        .map(|(k, v)| format!("{}={}", uri_encode(k), uri_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical headers string from the request headers and the
/// resolved host.
///
/// Only headers listed in `signed_headers` are included. Names are
/// lowercased, values trimmed with internal whitespace collapsed, and
/// entries sorted by name. `host` always comes from the `host` argument,
/// never from `headers`, even if a `host` entry happens to be present there.
#[must_use]
pub fn build_canonical_headers(headers: &[(&str, &str)], signed_headers: &[&str], host: &str) -> String {
    let mut header_map: BTreeMap<String, String> = BTreeMap::new();
    header_map.insert("host".to_owned(), host.trim().to_owned());

    for (name, value) in headers {
        let lower_name = name.to_lowercase();
        if lower_name == "host" {
            continue;
        }
        let trimmed_value = collapse_whitespace(value.trim());
        header_map
            .entry(lower_name)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&trimmed_value);
            })
            .or_insert(trimmed_value);
    }

    let mut sorted_signed: Vec<&str> = signed_headers.to_vec();
    sorted_signed.sort_unstable();

    sorted_signed
        .iter()
        .filter_map(|name| header_map.get(*name).map(|value| format!("{name}:{value}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the `SignedHeaders` line: a semicolon-separated, sorted list of
/// lowercase header names.
#[must_use]
pub fn build_signed_headers_string(signed_headers: &[&str]) -> String {
    let mut sorted: Vec<&str> = signed_headers.to_vec();
    sorted.sort_unstable();
    sorted.join(";")
}

fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_build_canonical_uri_for_simple_path() {
        assert_eq!(build_canonical_uri("/test.txt"), "/test.txt");
    }

    #[test]
    fn test_should_normalize_empty_path_to_slash() {
        assert_eq!(build_canonical_uri(""), "/");
        assert_eq!(build_canonical_uri("/"), "/");
    }

    #[test]
    fn test_should_encode_special_characters_in_path() {
        assert_eq!(build_canonical_uri("/hello world"), "/hello%20world");
    }

    #[test]
    fn test_should_sort_and_encode_query_parameters() {
        assert_eq!(build_canonical_query_string("b=2&a=1&c=3"), "a=1&b=2&c=3");
    }

    #[test]
    fn test_should_return_empty_for_empty_query() {
        assert_eq!(build_canonical_query_string(""), "");
    }

    #[test]
    fn test_should_percent_encode_query_values() {
        assert_eq!(
            build_canonical_query_string("events=s3:ObjectCreated:*"),
            "events=s3%3AObjectCreated%3A%2A"
        );
    }

    #[test]
    fn test_should_sort_duplicate_query_keys_by_value() {
        let query = "events=s3:ObjectCreated:*&events=s3:ObjectAccessed:*&prefix=p";
        let result = build_canonical_query_string(query);
        assert_eq!(
            result,
            "events=s3%3AObjectAccessed%3A%2A&events=s3%3AObjectCreated%3A%2A&prefix=p"
        );
    }

    #[test]
    fn test_should_read_host_from_dedicated_argument() {
        let headers = [("Host", "wrong.example.com"), ("Range", "bytes=0-9")];
        let signed = ["host", "range"];
        let result = build_canonical_headers(&headers, &signed, "examplebucket.s3.amazonaws.com");
        assert!(result.contains("host:examplebucket.s3.amazonaws.com"));
        assert!(!result.contains("wrong.example.com"));
    }

    #[test]
    fn test_should_collapse_whitespace_in_header_values() {
        let headers = [("X-Custom", "a   b   c")];
        let signed = ["host", "x-custom"];
        let result = build_canonical_headers(&headers, &signed, "example.com");
        assert_eq!(result, "host:example.com\nx-custom:a b c");
    }

    #[test]
    fn test_should_build_canonical_request_matching_aws_example() {
        use sha2::{Digest, Sha256};

        let headers = [
            ("range", "bytes=0-9"),
            (
                "x-amz-content-sha256",
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            ),
            ("x-amz-date", "20130524T000000Z"),
        ];
        let signed_headers = ["host", "range", "x-amz-content-sha256", "x-amz-date"];

        let canonical = build_canonical_request(
            "GET",
            "/test.txt",
            "",
            &headers,
            &signed_headers,
            "examplebucket.s3.amazonaws.com",
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        );

        let expected = "GET\n\
                        /test.txt\n\
                        \n\
                        host:examplebucket.s3.amazonaws.com\n\
                        range:bytes=0-9\n\
                        x-amz-content-sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\n\
                        x-amz-date:20130524T000000Z\n\
                        \n\
                        host;range;x-amz-content-sha256;x-amz-date\n\
                        e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        assert_eq!(canonical, expected);

        let hash = hex::encode(Sha256::digest(canonical.as_bytes()));
        assert_eq!(
            hash,
            "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972"
        );
    }

    #[test]
    fn test_should_not_double_encode_uri_path() {
        assert_eq!(build_canonical_uri("/hello%20world"), "/hello%20world");
        assert_eq!(
            build_canonical_uri("/hello world"),
            build_canonical_uri("/hello%20world")
        );
    }
}
