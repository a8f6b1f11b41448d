//! `Sitemap:` directive extraction from robots.txt content

use regex::Regex;
use std::sync::OnceLock;

/// Matches one `Sitemap: <url>` line, case-insensitively
fn directive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?im)^[ \t]*sitemap[ \t]*:[ \t]*(\S+)[ \t]*\r?$")
            .expect("sitemap directive pattern is valid")
    })
}

/// Extracts sitemap URLs from robots.txt content
///
/// Every line of the form `Sitemap: <url>` (any capitalization of the key) is
/// matched. URLs are returned in file order, without deduplication or
/// validation.
///
/// # Arguments
///
/// * `robots` - The raw robots.txt content
///
/// # Returns
///
/// The advertised sitemap URLs, in the order they appear
///
/// # Example
///
/// ```
/// use sitemap_stream::robots::extract_sitemap_directives;
///
/// let robots = "User-agent: *\nDisallow: /admin\nSitemap: https://example.com/sitemap.xml\n";
/// assert_eq!(
///     extract_sitemap_directives(robots),
///     vec!["https://example.com/sitemap.xml".to_string()]
/// );
/// ```
pub fn extract_sitemap_directives(robots: &str) -> Vec<String> {
    directive_pattern()
        .captures_iter(robots)
        .filter_map(|captures| captures.get(1))
        .map(|url| url.as_str().to_string())
        .collect()
}
