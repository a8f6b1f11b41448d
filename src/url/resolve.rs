use crate::UrlError;
use url::Url;

/// Resolves a `<loc>` value against the URL of the document it appears in
///
/// Standard relative-reference resolution is used when the base parses as an
/// absolute URL. If it does not, an absolute reference is still normalized and
/// anything else is returned unchanged. An empty reference stays empty rather
/// than resolving to the base itself.
///
/// # Arguments
///
/// * `base` - URL of the containing document
/// * `reference` - Text found inside `<loc>`
///
/// # Examples
///
/// ```
/// use sitemap_stream::url::resolve_against;
///
/// let base = "https://example.com/sitemaps/index.xml";
/// assert_eq!(resolve_against(base, "a.xml"), "https://example.com/sitemaps/a.xml");
/// assert_eq!(resolve_against(base, "/b.xml"), "https://example.com/b.xml");
/// assert_eq!(resolve_against(base, ""), "");
/// ```
pub fn resolve_against(base: &str, reference: &str) -> String {
    let reference = reference.trim();
    if reference.is_empty() {
        return String::new();
    }

    let resolved = match Url::parse(base) {
        Ok(base_url) => base_url.join(reference),
        Err(_) => Url::parse(reference),
    };

    resolved
        .map(String::from)
        .unwrap_or_else(|_| reference.to_string())
}

/// Parses a string as an absolute HTTP(S) URL
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL
/// * `Err(UrlError)` - The string is not a URL or uses another scheme
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    Ok(url)
}
