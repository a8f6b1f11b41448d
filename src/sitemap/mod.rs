//! Sitemap document model and streaming extraction
//!
//! This module contains everything needed to turn one sitemap document into
//! page records and child sitemap references:
//! - Page records and the callback flow signal
//! - A pull-based tokenizer over an async byte source
//! - The tag-state extractor driven by those tokens

mod extractor;
mod tokenizer;

pub use extractor::{DocumentKind, Extractor};
pub use tokenizer::{Tokenizer, XmlToken};

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

/// A page discovered in a page-set document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Absolute page URL (empty when the record had no `<loc>`)
    pub url: String,

    /// The `<lastmod>` value exactly as written in the document
    pub last_modified: String,

    /// URL of the sitemap document that directly contained this page
    pub source_sitemap_url: String,
}

impl Page {
    /// Creates an empty record belonging to the given sitemap
    pub fn empty(source_sitemap_url: &str) -> Self {
        Self {
            url: String::new(),
            last_modified: String::new(),
            source_sitemap_url: source_sitemap_url.to_string(),
        }
    }

    /// Interprets `last_modified` as a W3C datetime
    ///
    /// Accepts full RFC 3339 timestamps, minute-precision timestamps with an
    /// offset, and plain dates (taken as midnight UTC). The raw string is left
    /// untouched; this is a best-effort reading of it.
    ///
    /// # Returns
    ///
    /// * `Some(DateTime)` - The parsed timestamp
    /// * `None` - The value is empty or in an unrecognized format
    pub fn last_modified_at(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.last_modified.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed);
        }

        let with_offset = match raw.strip_suffix(['Z', 'z']) {
            Some(local) => format!("{}+00:00", local),
            None => raw.to_string(),
        };
        if let Ok(parsed) = DateTime::parse_from_str(&with_offset, "%Y-%m-%dT%H:%M%:z") {
            return Some(parsed);
        }

        let midnight = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?;
        Some(FixedOffset::east_opt(0)?.from_utc_datetime(&midnight))
    }
}

/// Signal returned by a page callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep delivering pages from the current document
    Continue,

    /// Stop reading the current document and release its source
    Stop,
}

impl Flow {
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::Stop)
    }
}
