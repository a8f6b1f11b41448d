use crate::sitemap::{Flow, Page};
use std::sync::{Mutex, PoisonError};

/// Accumulates every delivered page
///
/// Used as the page callback by the `collect*` operations. It never asks the
/// traversal to stop. Pages from sibling sitemaps traversed concurrently are
/// interleaved in arrival order; pages of one document keep document order.
#[derive(Debug, Default)]
pub struct PageCollector {
    pages: Mutex<Vec<Page>>,
}

impl PageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a page and tells the traversal to keep going
    pub fn push(&self, page: Page) -> Flow {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(page);
        Flow::Continue
    }

    pub fn len(&self) -> usize {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
