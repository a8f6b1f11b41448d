//! Traversal options and error recovery policy
//!
//! [`Options`] carries the caller's gates and limits through a whole traversal.
//! [`ErrorPolicy`] decides, per failed sitemap node, whether the failure is fatal
//! for that branch or should be treated as an empty, successful node.

use crate::SitemapError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Default cap on concurrently traversed child sitemaps
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Identifies the sitemap node an error occurred in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// URL of the sitemap that failed
    pub url: String,
}

/// Decides what a transport or parse failure means for one sitemap node
///
/// Returning `Ok(())` recovers: the node counts as completed with whatever it
/// delivered before failing. Returning an error makes it the node's outcome.
/// Retrying is not automatic; a policy that wants it must do so itself.
#[async_trait]
pub trait ErrorPolicy: Send + Sync {
    async fn on_error(&self, error: SitemapError, context: &ErrorContext)
        -> Result<(), SitemapError>;
}

/// Default policy: every failure is fatal for its branch
#[derive(Debug, Clone, Copy, Default)]
pub struct FailFast;

#[async_trait]
impl ErrorPolicy for FailFast {
    async fn on_error(
        &self,
        error: SitemapError,
        _context: &ErrorContext,
    ) -> Result<(), SitemapError> {
        Err(error)
    }
}

/// Logs the failure and carries on with the rest of the tree
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipFailed;

#[async_trait]
impl ErrorPolicy for SkipFailed {
    async fn on_error(
        &self,
        error: SitemapError,
        context: &ErrorContext,
    ) -> Result<(), SitemapError> {
        tracing::warn!("Skipping sitemap {}: {}", context.url, error);
        Ok(())
    }
}

/// Adapts a synchronous closure into an [`ErrorPolicy`]
pub struct PolicyFn<F>(F);

/// Builds an [`ErrorPolicy`] from a closure
///
/// # Example
///
/// ```
/// use sitemap_stream::policy::{policy_fn, Options};
///
/// // Tolerate failures of archive sitemaps only
/// let options = Options::new().with_error_policy(policy_fn(|err, ctx| {
///     if ctx.url.contains("/archive/") {
///         Ok(())
///     } else {
///         Err(err)
///     }
/// }));
/// ```
pub fn policy_fn<F>(f: F) -> PolicyFn<F>
where
    F: Fn(SitemapError, &ErrorContext) -> Result<(), SitemapError> + Send + Sync,
{
    PolicyFn(f)
}

#[async_trait]
impl<F> ErrorPolicy for PolicyFn<F>
where
    F: Fn(SitemapError, &ErrorContext) -> Result<(), SitemapError> + Send + Sync,
{
    async fn on_error(
        &self,
        error: SitemapError,
        context: &ErrorContext,
    ) -> Result<(), SitemapError> {
        (self.0)(error, context)
    }
}

/// Gate applied to a sitemap or page URL
pub type UrlPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Options shared by every node of one traversal
#[derive(Clone)]
pub struct Options {
    check_sitemap: UrlPredicate,
    check_url: UrlPredicate,
    error_policy: Arc<dyn ErrorPolicy>,
    max_parallel: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            check_sitemap: Arc::new(|_: &str| true),
            check_url: Arc::new(|_: &str| true),
            error_policy: Arc::new(FailFast),
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("max_parallel", &self.max_parallel)
            .finish_non_exhaustive()
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate consulted before fetching any sitemap, root or child
    pub fn with_check_sitemap<F>(mut self, check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.check_sitemap = Arc::new(check);
        self
    }

    /// Gate consulted before handing a page to the callback
    pub fn with_check_url<F>(mut self, check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.check_url = Arc::new(check);
        self
    }

    pub fn with_error_policy<P>(mut self, policy: P) -> Self
    where
        P: ErrorPolicy + 'static,
    {
        self.error_policy = Arc::new(policy);
        self
    }

    /// Caps concurrent child sitemap traversals; values below 1 are raised to 1
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    pub fn error_policy(&self) -> &dyn ErrorPolicy {
        self.error_policy.as_ref()
    }

    pub fn allows_sitemap(&self, url: &str) -> bool {
        (self.check_sitemap)(url)
    }

    pub fn allows_page(&self, url: &str) -> bool {
        (self.check_url)(url)
    }
}
