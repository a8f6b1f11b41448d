use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Sitemap URLs already claimed by a traversal
///
/// One set is shared by every node of a traversal (and by every root of a
/// `traverse_many` call), so each sitemap URL is fetched at most once no matter
/// how many indexes list it. URLs are compared as exact strings, without
/// normalization. Only the traversal itself adds URLs; callers can seed a set
/// with [`VisitedSet::with_urls`] to skip sitemaps they already processed.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set that treats `urls` as already visited
    pub fn with_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: Mutex::new(urls.into_iter().map(Into::into).collect()),
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of the visited URLs, sorted
    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.lock().iter().cloned().collect();
        urls.sort();
        urls
    }

    /// Claims `url`, returning false if it was already present
    ///
    /// Check and insert happen under one lock so two concurrent siblings
    /// listing the same child cannot both claim it.
    pub(crate) fn mark(&self, url: &str) -> bool {
        self.lock().insert(url.to_string())
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_claims_once() {
        let visited = VisitedSet::new();
        assert!(visited.is_empty());

        assert!(visited.mark("https://example.com/sitemap.xml"));
        assert!(!visited.mark("https://example.com/sitemap.xml"));

        assert!(visited.contains("https://example.com/sitemap.xml"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_urls_are_compared_exactly() {
        let visited = VisitedSet::new();
        visited.mark("https://example.com/sitemap.xml");

        assert!(!visited.contains("https://example.com/sitemap.xml/"));
        assert!(!visited.contains("https://EXAMPLE.com/sitemap.xml"));
    }

    #[test]
    fn test_with_urls_seeds_set() {
        let visited = VisitedSet::with_urls(["https://b.test/s.xml", "https://a.test/s.xml"]);

        assert!(!visited.mark("https://a.test/s.xml"));
        assert_eq!(
            visited.urls(),
            vec!["https://a.test/s.xml".to_string(), "https://b.test/s.xml".to_string()]
        );
    }

    #[test]
    fn test_concurrent_marks_have_one_winner() {
        let visited = std::sync::Arc::new(VisitedSet::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let visited = std::sync::Arc::clone(&visited);
                std::thread::spawn(move || visited.mark("https://example.com/child.xml"))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
    }
}
