//! S3-compatible `<Error>` XML formatting.
//!
//! The auth core rejects requests at the HTTP boundary (missing or invalid
//! `Authorization` header) before an S3 handler ever sees them, so it owns
//! formatting the wire-level error body. This crate intentionally covers
//! only that one document shape — bucket/object XML (listings, ACLs,
//! multipart responses) belongs to the S3 handler, out of scope here.
//!
//! # S3 error XML conventions
//!
//! - Namespace-free, flat `<Error>` element (`noErrorWrapping: true`)
//! - XML declaration: `<?xml version="1.0" encoding="UTF-8"?>`

pub mod error;

pub use error::{XmlError, error_to_xml};
