//! Sitemap-Stream main entry point
//!
//! This is the command-line interface for the Sitemap-Stream sitemap crawler.

use anyhow::{bail, Context};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use clap::Parser;
use sitemap_stream::config::{load_config, Config};
use sitemap_stream::url::parse_http_url;
use sitemap_stream::{
    extract_sitemap_directives, Flow, HttpTransport, Page, SitemapWalker, SkipFailed, VisitedSet,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

/// Sitemap-Stream: an incremental sitemap crawler
///
/// Walks sitemap indexes and page sets, printing every discovered page as
/// `url - lastmod` while the documents are still downloading.
#[derive(Parser, Debug)]
#[command(name = "sitemap-stream")]
#[command(version)]
#[command(about = "Stream every page listed in a sitemap tree", long_about = None)]
struct Cli {
    /// Sitemap or sitemap index URLs to traverse
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of child sitemaps fetched at once (overrides config)
    #[arg(long, value_name = "N")]
    max_parallel: Option<usize>,

    /// Stop after printing this many pages
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Only print pages last modified on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    since: Option<DateTime<FixedOffset>>,

    /// Read the root document from a local file; the single URL is its base URL
    #[arg(long, value_name = "FILE", conflicts_with = "robots_file")]
    input: Option<PathBuf>,

    /// Traverse the Sitemap: directives of a local robots.txt
    #[arg(long, value_name = "FILE")]
    robots_file: Option<PathBuf>,

    /// Log failed sitemaps and keep going instead of failing
    #[arg(long)]
    skip_errors: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    let walker = build_walker(&cli, &config)?;
    let printer = PagePrinter {
        since: cli.since,
        limit: cli.limit,
        printed: AtomicUsize::new(0),
    };
    let on_page = |page: Page| printer.print(page);

    let result = if let Some(input) = &cli.input {
        let [base_url] = cli.urls.as_slice() else {
            bail!("--input needs exactly one URL to use as the document's base URL");
        };
        parse_http_url(base_url).with_context(|| format!("invalid base URL '{}'", base_url))?;
        let file = tokio::fs::File::open(input)
            .await
            .with_context(|| format!("failed to read {}", input.display()))?;
        walker
            .traverse_from_reader(base_url, tokio::io::BufReader::new(file), &on_page)
            .await
    } else {
        let mut roots = cli.urls.clone();
        if let Some(robots) = &cli.robots_file {
            let text = std::fs::read_to_string(robots)
                .with_context(|| format!("failed to read {}", robots.display()))?;
            let directives = extract_sitemap_directives(&text);
            tracing::info!("Found {} sitemap directive(s) in {}", directives.len(), robots.display());
            roots.extend(directives);
        }
        if roots.is_empty() {
            bail!("no sitemap URLs given");
        }
        for root in &roots {
            parse_http_url(root).with_context(|| format!("invalid sitemap URL '{}'", root))?;
        }

        walker
            .traverse_many(roots, &on_page, &VisitedSet::new())
            .await
    };

    match result {
        Ok(()) => {
            tracing::info!(
                "Traversal completed, {} page(s) printed",
                printer.printed.load(Ordering::SeqCst)
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Traversal failed: {}", e);
            Err(e).context("sitemap traversal failed")
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemap_stream=warn"),
            1 => EnvFilter::new("sitemap_stream=info,warn"),
            2 => EnvFilter::new("sitemap_stream=debug,info"),
            _ => EnvFilter::new("sitemap_stream=trace,debug"),
        }
    };

    // Pages go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the walker from configuration and command-line overrides
fn build_walker(cli: &Cli, config: &Config) -> anyhow::Result<SitemapWalker> {
    let mut options = config.to_options().context("invalid filter configuration")?;
    if let Some(max_parallel) = cli.max_parallel {
        options = options.with_max_parallel(max_parallel);
    }
    if cli.skip_errors {
        options = options.with_error_policy(SkipFailed);
    }

    let transport =
        HttpTransport::from_config(&config.http).context("failed to build HTTP client")?;

    Ok(SitemapWalker::new(transport, options))
}

/// Prints pages as `url - lastmod`, honoring --since and --limit
struct PagePrinter {
    since: Option<DateTime<FixedOffset>>,
    limit: Option<usize>,
    printed: AtomicUsize,
}

impl PagePrinter {
    fn print(&self, page: Page) -> Flow {
        if let Some(since) = self.since {
            match page.last_modified_at() {
                Some(modified) if modified >= since => {}
                _ => return Flow::Continue,
            }
        }

        // Reserve the slot before printing
        let slot = self.printed.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.limit {
            if slot >= limit {
                self.printed.fetch_sub(1, Ordering::SeqCst);
                return Flow::Stop;
            }
        }

        println!("{} - {}", page.url, page.last_modified);

        match self.limit {
            Some(limit) if slot + 1 >= limit => Flow::Stop,
            _ => Flow::Continue,
        }
    }
}

/// Parses a YYYY-MM-DD date as midnight UTC
fn parse_date(value: &str) -> Result<DateTime<FixedOffset>, String> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| "invalid date".to_string())?;
    Ok(Utc.from_utc_datetime(&midnight).fixed_offset())
}
