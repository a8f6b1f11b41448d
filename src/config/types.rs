use crate::policy::{Options, DEFAULT_MAX_PARALLEL};
use crate::url::DomainFilter;
use crate::ConfigError;
use regex::RegexSet;
use serde::Deserialize;

/// User agent sent when neither the config nor the environment sets one
pub const DEFAULT_USER_AGENT: &str = "sitemap-stream/0.1";

/// Main configuration structure for Sitemap-Stream
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub traversal: TraversalConfig,
    pub http: HttpConfig,
    pub filter: FilterConfig,
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Maximum number of child sitemaps traversed at once
    #[serde(rename = "max-parallel")]
    pub max_parallel: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent header; `SITEMAP_STREAM_USER_AGENT` takes precedence
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total time allowed for one request, body included (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Time allowed to establish a connection (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// URL filtering configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Domain patterns (e.g., "example.com" or "*.example.com"); empty allows all
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Regexes; page URLs matching any of them are skipped
    #[serde(rename = "exclude-patterns")]
    pub exclude_patterns: Vec<String>,

    /// Regexes; sitemap URLs matching any of them are not fetched
    #[serde(rename = "sitemap-exclude-patterns")]
    pub sitemap_exclude_patterns: Vec<String>,
}

impl Config {
    /// Builds traversal options from this configuration
    ///
    /// Sitemaps must pass the domain filter and miss every sitemap exclude
    /// pattern; pages must pass the domain filter and miss every page
    /// exclude pattern. The error policy is left at its default.
    pub fn to_options(&self) -> Result<Options, ConfigError> {
        let page_domains = DomainFilter::new(self.filter.allowed_domains.clone());
        let sitemap_domains = page_domains.clone();
        let page_excludes = compile_patterns(&self.filter.exclude_patterns)?;
        let sitemap_excludes = compile_patterns(&self.filter.sitemap_exclude_patterns)?;

        Ok(Options::new()
            .with_max_parallel(self.traversal.max_parallel)
            .with_check_sitemap(move |url| {
                sitemap_domains.allows(url) && !sitemap_excludes.is_match(url)
            })
            .with_check_url(move |url| page_domains.allows(url) && !page_excludes.is_match(url)))
    }
}

pub(crate) fn compile_patterns(patterns: &[String]) -> Result<RegexSet, ConfigError> {
    RegexSet::new(patterns).map_err(|e| ConfigError::InvalidPattern(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.traversal.max_parallel, DEFAULT_MAX_PARALLEL);
        assert_eq!(config.http.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert!(config.filter.allowed_domains.is_empty());
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config: Config = toml::from_str(
            r#"
[http]
user-agent = "MyBot/2.0"
"#,
        )
        .unwrap();

        assert_eq!(config.http.user_agent, "MyBot/2.0");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.traversal.max_parallel, DEFAULT_MAX_PARALLEL);
    }

    #[test]
    fn test_to_options_applies_filters() {
        let mut config = Config::default();
        config.traversal.max_parallel = 2;
        config.filter.allowed_domains = vec!["*.example.com".to_string()];
        config.filter.exclude_patterns = vec!["/tag/".to_string()];
        config.filter.sitemap_exclude_patterns = vec!["archive".to_string()];

        let options = config.to_options().unwrap();

        assert_eq!(options.max_parallel(), 2);
        assert!(options.allows_sitemap("https://example.com/sitemap.xml"));
        assert!(!options.allows_sitemap("https://example.com/archive.xml"));
        assert!(!options.allows_sitemap("https://other.org/sitemap.xml"));
        assert!(options.allows_page("https://blog.example.com/post"));
        assert!(options.allows_page("https://example.com/archive"));
        assert!(!options.allows_page("https://example.com/tag/rust"));
        assert!(!options.allows_page("https://other.org/post"));
    }

    #[test]
    fn test_to_options_rejects_bad_regex() {
        let mut config = Config::default();
        config.filter.exclude_patterns = vec!["(unclosed".to_string()];

        assert!(matches!(
            config.to_options(),
            Err(ConfigError::InvalidPattern(_))
        ));
    }
}
