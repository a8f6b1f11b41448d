//! Crawler module for sitemap tree traversal
//!
//! This module contains the traversal engine, including:
//! - Streaming transports (HTTP and in-memory)
//! - The bounded concurrency scheduler
//! - Visited-set bookkeeping for duplicate protection
//! - The orchestrator walking indexes and page sets
//! - A buffering page collector

mod collector;
mod coordinator;
mod fetcher;
mod scheduler;
mod visited;

pub use collector::PageCollector;
pub use coordinator::SitemapWalker;
pub use fetcher::{build_http_client, HttpTransport, SitemapSource, Transport, USER_AGENT_ENV};
pub use scheduler::run_capped;
pub use visited::VisitedSet;

use crate::policy::Options;
use crate::sitemap::{Flow, Page};
use crate::Result;

/// Streams every page of the sitemap tree rooted at `url` over HTTP
///
/// This is the main entry point for a one-off traversal. It will:
/// 1. Build an HTTP transport with default settings
/// 2. Fetch the root and stream its pages to `on_page`
/// 3. Follow child sitemaps of indexes, at most `options.max_parallel()` at once
///
/// # Returns
///
/// * `Ok(())` - Every branch completed or was recovered by the error policy
/// * `Err(SitemapError)` - The root failed, or one or more branches failed
pub async fn traverse<F>(url: &str, on_page: &F, options: Options) -> Result<()>
where
    F: Fn(Page) -> Flow + Send + Sync,
{
    SitemapWalker::http(options)?.traverse(url, on_page).await
}

/// Buffers every page of the sitemap tree rooted at `url` over HTTP
pub async fn collect(url: &str, options: Options) -> Result<Vec<Page>> {
    SitemapWalker::http(options)?.collect(url).await
}
