//! Configuration module for Sitemap-Stream
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and turning them into traversal options and HTTP client settings.
//!
//! # Example
//!
//! ```no_run
//! use sitemap_stream::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitemap-stream.toml")).unwrap();
//! let options = config.to_options().unwrap();
//! println!("Traversing with up to {} parallel sitemaps", options.max_parallel());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FilterConfig, HttpConfig, TraversalConfig, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::{validate, MAX_PARALLEL_LIMIT};
