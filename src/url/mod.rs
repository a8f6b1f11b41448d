//! URL handling module
//!
//! This module provides base-URL resolution for `<loc>` values, HTTP URL
//! validation, domain extraction and wildcard domain filtering.

mod domain;
mod resolve;

// Re-export main functions
pub use domain::{domain_of, matches_wildcard, DomainFilter};
pub use resolve::{parse_http_url, resolve_against};
