//! Traversal orchestrator
//!
//! `SitemapWalker` drives one sitemap tree:
//! 1. Claims each sitemap URL in the shared `VisitedSet` before fetching it
//! 2. Streams the document through the tokenizer and extractor
//! 3. Forwards accepted pages to the caller as they are parsed
//! 4. Fans out over child sitemaps of an index through `run_capped`
//! 5. Routes fetch and parse failures through the configured error policy
//!
//! The source of a document is closed before its children are fetched, so an
//! index never holds a connection while its subtree is being walked.

use crate::config::HttpConfig;
use crate::crawler::{run_capped, HttpTransport, PageCollector, SitemapSource, Transport, VisitedSet};
use crate::policy::{ErrorContext, Options};
use crate::sitemap::{DocumentKind, Extractor, Flow, Page, Tokenizer};
use crate::{Result, SitemapError};
use futures::future::BoxFuture;
use std::io::Cursor;
use std::sync::Arc;
use tokio::io::AsyncBufRead;

/// Page callback as seen by the traversal internals
type PageSink<'a> = dyn Fn(Page) -> Flow + Send + Sync + 'a;

/// What one fully read (or stopped) document turned out to be
enum Outcome {
    Pages { delivered: usize, stopped: bool },
    Index(Vec<String>),
    Unrecognized,
}

/// Walks sitemap trees over a pluggable transport
///
/// # Example
///
/// ```no_run
/// use sitemap_stream::{Flow, Options, SitemapWalker};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let walker = SitemapWalker::http(Options::default())?;
/// walker
///     .traverse("https://example.com/sitemap.xml", &|page| {
///         println!("{} - {}", page.url, page.last_modified);
///         Flow::Continue
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct SitemapWalker {
    transport: Arc<dyn Transport>,
    options: Options,
}

impl SitemapWalker {
    pub fn new<T>(transport: T, options: Options) -> Self
    where
        T: Transport + 'static,
    {
        Self::with_transport(Arc::new(transport), options)
    }

    /// Creates a walker over a transport shared with other walkers
    pub fn with_transport(transport: Arc<dyn Transport>, options: Options) -> Self {
        Self { transport, options }
    }

    /// Creates a walker that fetches over HTTP with default client settings
    pub fn http(options: Options) -> Result<Self> {
        Ok(Self::new(HttpTransport::from_config(&HttpConfig::default())?, options))
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Streams every page reachable from `url` to `on_page`
    ///
    /// Uses a fresh visited set, so each sitemap in the tree is fetched at
    /// most once during this call.
    pub async fn traverse<F>(&self, url: &str, on_page: &F) -> Result<()>
    where
        F: Fn(Page) -> Flow + Send + Sync,
    {
        self.traverse_with(url, on_page, &VisitedSet::new()).await
    }

    /// Like [`traverse`](Self::traverse), sharing `visited` with other calls
    ///
    /// A URL already in `visited` completes immediately without fetching.
    pub async fn traverse_with<F>(&self, url: &str, on_page: &F, visited: &VisitedSet) -> Result<()>
    where
        F: Fn(Page) -> Flow + Send + Sync,
    {
        self.visit(url.to_string(), on_page, visited).await
    }

    /// Traverses several roots concurrently, sharing one visited set
    ///
    /// Roots are scheduled like the children of an index: at most
    /// `max_parallel` at once, every root runs to completion and failures are
    /// reported together as [`SitemapError::Aggregate`].
    pub async fn traverse_many<I, S, F>(&self, urls: I, on_page: &F, visited: &VisitedSet) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Page) -> Flow + Send + Sync,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        self.fan_out(urls, on_page, visited).await
    }

    /// Traverses a document read from `reader`, as if it had been fetched from `base_url`
    ///
    /// The reader is consumed incrementally, like a network body, and dropped
    /// before any child sitemap is fetched. `base_url` resolves relative
    /// locations and is marked visited, so an index that lists it does not
    /// fetch it again. Child sitemaps are fetched through the transport.
    pub async fn traverse_from_reader<R, F>(&self, base_url: &str, reader: R, on_page: &F) -> Result<()>
    where
        R: AsyncBufRead + Send + 'static,
        F: Fn(Page) -> Flow + Send + Sync,
    {
        let visited = VisitedSet::new();
        if !self.claim(base_url, &visited) {
            return Ok(());
        }

        let source = SitemapSource::new(base_url, reader);
        self.process(base_url, source, on_page, &visited).await
    }

    /// Traverses a document held in memory, as if it had been fetched from `base_url`
    ///
    /// See [`traverse_from_reader`](Self::traverse_from_reader).
    pub async fn traverse_from_content<F>(
        &self,
        base_url: &str,
        xml: impl Into<Vec<u8>>,
        on_page: &F,
    ) -> Result<()>
    where
        F: Fn(Page) -> Flow + Send + Sync,
    {
        self.traverse_from_reader(base_url, Cursor::new(xml.into()), on_page)
            .await
    }

    /// Buffers every page reachable from `url`
    ///
    /// On failure the pages gathered so far are discarded and the error is
    /// returned; use [`traverse`](Self::traverse) to keep partial results.
    pub async fn collect(&self, url: &str) -> Result<Vec<Page>> {
        let collector = PageCollector::new();
        self.traverse(url, &|page| collector.push(page)).await?;
        Ok(collector.into_pages())
    }

    /// Buffers every page reachable from any of `urls`
    pub async fn collect_many<I, S>(&self, urls: I) -> Result<Vec<Page>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let collector = PageCollector::new();
        let visited = VisitedSet::new();
        self.traverse_many(urls, &|page| collector.push(page), &visited)
            .await?;
        Ok(collector.into_pages())
    }

    /// Buffers every page reachable from a document read from `reader`
    pub async fn collect_from_reader<R>(&self, base_url: &str, reader: R) -> Result<Vec<Page>>
    where
        R: AsyncBufRead + Send + 'static,
    {
        let collector = PageCollector::new();
        self.traverse_from_reader(base_url, reader, &|page| collector.push(page))
            .await?;
        Ok(collector.into_pages())
    }

    /// Buffers every page reachable from an in-memory document
    pub async fn collect_from_content(&self, base_url: &str, xml: impl Into<Vec<u8>>) -> Result<Vec<Page>> {
        self.collect_from_reader(base_url, Cursor::new(xml.into()))
            .await
    }

    fn visit<'a>(
        &'a self,
        url: String,
        on_page: &'a PageSink<'a>,
        visited: &'a VisitedSet,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if !self.claim(&url, visited) {
                return Ok(());
            }

            tracing::info!("Fetching sitemap {}", url);
            let source = match self.transport.open(&url).await {
                Ok(source) => source,
                Err(error) => return self.recover(&url, error).await,
            };

            self.process(&url, source, on_page, visited).await
        })
    }

    /// Decides whether `url` should be fetched and marks it visited if so
    ///
    /// The contains/gate/mark sequence has no suspension point, and `mark`
    /// itself is atomic, so concurrent siblings racing on one URL produce a
    /// single winner.
    fn claim(&self, url: &str, visited: &VisitedSet) -> bool {
        if visited.contains(url) {
            tracing::debug!("Sitemap {} already visited", url);
            return false;
        }

        if !self.options.allows_sitemap(url) {
            tracing::debug!("Sitemap {} excluded by sitemap filter", url);
            return false;
        }

        visited.mark(url)
    }

    async fn process(
        &self,
        url: &str,
        source: SitemapSource,
        on_page: &PageSink<'_>,
        visited: &VisitedSet,
    ) -> Result<()> {
        let outcome = match self.consume(url, source, on_page).await {
            Ok(outcome) => outcome,
            Err(error) => return self.recover(url, error).await,
        };

        match outcome {
            Outcome::Pages { delivered, stopped } => {
                tracing::info!(
                    "Sitemap {} delivered {} page(s){}",
                    url,
                    delivered,
                    if stopped { " before being stopped" } else { "" }
                );
                Ok(())
            }
            Outcome::Index(children) => {
                tracing::info!("Sitemap index {} lists {} child sitemap(s)", url, children.len());
                self.fan_out(children, on_page, visited).await
            }
            Outcome::Unrecognized => {
                tracing::debug!("{} is neither a urlset nor a sitemapindex", url);
                Ok(())
            }
        }
    }

    /// Reads one document to its end, or until the callback stops it
    ///
    /// The source is closed on every path out of this function.
    async fn consume(
        &self,
        url: &str,
        source: SitemapSource,
        on_page: &PageSink<'_>,
    ) -> Result<Outcome> {
        let mut tokenizer = Tokenizer::new(url, source);
        let mut extractor = Extractor::new(url);

        let options = &self.options;
        let mut delivered = 0usize;
        let mut deliver = |page: Page| {
            if !options.allows_page(&page.url) {
                tracing::trace!("Page {} excluded by URL filter", page.url);
                return Flow::Continue;
            }
            delivered += 1;
            on_page(page)
        };

        let read = loop {
            match tokenizer.next_token().await {
                Ok(Some(token)) => {
                    if extractor.handle(token, &mut deliver).is_stop() {
                        tracing::debug!("Page callback stopped reading {}", url);
                        break Ok(());
                    }
                }
                Ok(None) => break Ok(()),
                Err(error) => break Err(error),
            }
        };

        tokenizer.into_inner().close();
        read?;

        Ok(match extractor.kind() {
            DocumentKind::PageSet => Outcome::Pages {
                delivered,
                stopped: extractor.is_ended(),
            },
            DocumentKind::Index => Outcome::Index(extractor.into_children()),
            DocumentKind::Unknown => Outcome::Unrecognized,
        })
    }

    async fn fan_out(
        &self,
        urls: Vec<String>,
        on_page: &PageSink<'_>,
        visited: &VisitedSet,
    ) -> Result<()> {
        let tasks: Vec<BoxFuture<'_, Result<()>>> = urls
            .into_iter()
            .map(|child| self.visit(child, on_page, visited))
            .collect();

        run_capped(tasks, self.options.max_parallel())
            .await
            .map(|_| ())
            .map_err(SitemapError::Aggregate)
    }

    /// Hands a node failure to the error policy
    async fn recover(&self, url: &str, error: SitemapError) -> Result<()> {
        let context = ErrorContext {
            url: url.to_string(),
        };

        match self.options.error_policy().on_error(error, &context).await {
            Ok(()) => {
                tracing::warn!("Error policy recovered sitemap {}", url);
                Ok(())
            }
            Err(error) => {
                tracing::error!("Sitemap {} failed: {}", url, error);
                Err(error)
            }
        }
    }
}
