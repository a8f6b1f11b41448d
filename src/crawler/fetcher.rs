//! Sitemap transport
//!
//! This module provides the byte sources the traversal reads documents from:
//! - The `Transport` trait, the seam between traversal and fetching
//! - `SitemapSource`, an open document stream that can be closed mid-read
//! - `HttpTransport`, which streams response bodies with reqwest
//!
//! Closing a source drops the underlying stream. For HTTP this aborts the
//! response body instead of draining it, so an early stop releases the
//! connection.

use crate::config::HttpConfig;
use crate::SitemapError;
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Client;
use std::fmt;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncRead, ReadBuf};
use tokio_util::io::StreamReader;

/// Environment variable that overrides the configured user agent
pub const USER_AGENT_ENV: &str = "SITEMAP_STREAM_USER_AGENT";

/// An open, streaming sitemap document
pub struct SitemapSource {
    url: String,
    reader: Pin<Box<dyn AsyncBufRead + Send>>,
}

impl SitemapSource {
    /// Wraps any buffered async reader as the body of the document at `url`
    pub fn new<R>(url: &str, reader: R) -> Self
    where
        R: AsyncBufRead + Send + 'static,
    {
        Self {
            url: url.to_string(),
            reader: Box::pin(reader),
        }
    }

    /// Serves an in-memory document
    pub fn from_bytes(url: &str, body: impl Into<Vec<u8>>) -> Self {
        Self::new(url, Cursor::new(body.into()))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Closes the source, releasing the underlying stream or connection
    pub fn close(self) {
        tracing::debug!("Closing source for {}", self.url);
        drop(self);
    }
}

impl fmt::Debug for SitemapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SitemapSource")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl AsyncRead for SitemapSource {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.reader.as_mut().poll_read(cx, buf)
    }
}

impl AsyncBufRead for SitemapSource {
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        self.get_mut().reader.as_mut().poll_fill_buf(cx)
    }

    fn consume(mut self: Pin<&mut Self>, amt: usize) {
        self.reader.as_mut().consume(amt)
    }
}

/// Opens sitemap documents by URL
///
/// Implementations report fetch, network and status failures as transport
/// errors and must hand back a source that stops all I/O once dropped.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, url: &str) -> Result<SitemapSource, SitemapError>;
}

/// Builds an HTTP client with the configured user agent and timeouts
///
/// The user agent comes from `SITEMAP_STREAM_USER_AGENT` when set, otherwise
/// from the configuration. Compressed transfer encodings (gzip, brotli) are
/// decoded transparently.
///
/// # Example
///
/// ```
/// use sitemap_stream::config::HttpConfig;
/// use sitemap_stream::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let user_agent =
        std::env::var(USER_AGENT_ENV).unwrap_or_else(|_| config.user_agent.clone());

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Streams sitemap documents over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the default HTTP settings
    pub fn new() -> Result<Self, SitemapError> {
        Self::from_config(&HttpConfig::default())
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self, SitemapError> {
        let client = build_http_client(config).map_err(SitemapError::Client)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    /// Sends a GET request and exposes the body as a byte stream
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | streaming source |
    /// | any other status | `SitemapError::Status` |
    /// | connect/timeout/other request failure | `SitemapError::Http` |
    async fn open(&self, url: &str) -> Result<SitemapSource, SitemapError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SitemapError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SitemapError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        tracing::debug!("Streaming {} (HTTP {})", url, status.as_u16());

        let body = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));

        Ok(SitemapSource::new(url, StreamReader::new(body)))
    }
}
