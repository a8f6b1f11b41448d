//! Sitemap-Stream: an incremental sitemap tree crawler
//!
//! This crate walks a sitemap tree starting from a root document, streaming every
//! discovered page to a caller-supplied callback without buffering whole documents.
//! Sitemap indexes are followed recursively with duplicate protection and a bounded
//! number of concurrent child fetches.

pub mod config;
pub mod crawler;
pub mod policy;
pub mod robots;
pub mod sitemap;
pub mod url;

use thiserror::Error;

/// Main error type for sitemap traversal
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Stream error while reading {url}: {message}")]
    Io { url: String, message: String },

    #[error("XML parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("{} sitemap(s) failed: {}", .0.len(), summarize(.0))]
    Aggregate(Vec<SitemapError>),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),
}

impl SitemapError {
    /// Returns the sitemap URL this error belongs to, if it concerns a single node
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Http { url, .. }
            | Self::Status { url, .. }
            | Self::Transport { url, .. }
            | Self::Io { url, .. }
            | Self::Parse { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Returns true for fetch, network and HTTP status failures
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Status { .. } | Self::Transport { .. } | Self::Io { .. }
        )
    }

    /// Returns true for malformed XML
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Lists the sitemap URLs that failed, flattening nested aggregates in order
    pub fn failed_urls(&self) -> Vec<&str> {
        match self {
            Self::Aggregate(errors) => errors.iter().flat_map(|e| e.failed_urls()).collect(),
            other => other.url().into_iter().collect(),
        }
    }
}

fn summarize(errors: &[SitemapError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for sitemap operations
pub type Result<T> = std::result::Result<T, SitemapError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    run_capped, HttpTransport, PageCollector, SitemapSource, SitemapWalker, Transport, VisitedSet,
};
pub use policy::{ErrorContext, ErrorPolicy, FailFast, Options, SkipFailed};
pub use robots::extract_sitemap_directives;
pub use sitemap::{Flow, Page};
