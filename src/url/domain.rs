use url::Url;

/// Extracts the lowercase host of a URL string
///
/// # Returns
///
/// * `Some(String)` - The lowercase host
/// * `None` - If the string is not an absolute URL with a host
///
/// # Examples
///
/// ```
/// use sitemap_stream::url::domain_of;
///
/// assert_eq!(domain_of("https://EXAMPLE.com:8080/a"), Some("example.com".to_string()));
/// assert_eq!(domain_of("/relative/path"), None);
/// ```
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| host.to_ascii_lowercase())
}

/// Checks if a domain matches a wildcard pattern, ignoring case
///
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches "example.com" and any subdomain
///    of it, however deeply nested
///
/// # Examples
///
/// ```
/// use sitemap_stream::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.example.com", "blog.example.com"));
/// assert!(matches_wildcard("*.example.com", "EXAMPLE.com"));
/// assert!(!matches_wildcard("*.example.com", "myexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let candidate = candidate.to_ascii_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => candidate == base || candidate.ends_with(&format!(".{}", base)),
        None => candidate == pattern,
    }
}

/// Restricts traversal to a set of domain patterns
///
/// An empty filter allows everything. URLs without a host (including empty
/// page URLs) are rejected by a non-empty filter.
#[derive(Debug, Clone, Default)]
pub struct DomainFilter {
    patterns: Vec<String>,
}

impl DomainFilter {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns true if the URL's host matches any configured pattern
    pub fn allows(&self, url: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        match domain_of(url) {
            Some(domain) => self
                .patterns
                .iter()
                .any(|pattern| matches_wildcard(pattern, &domain)),
            None => false,
        }
    }
}
