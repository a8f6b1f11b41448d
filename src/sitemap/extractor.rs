//! Tag-state extractor
//!
//! Consumes the tokens of exactly one document and produces, in document order,
//! either page records (for a `<urlset>`) or child sitemap URLs (for a
//! `<sitemapindex>`). The document kind is decided by the root element and never
//! changes afterwards.
//!
//! # Transition Table
//!
//! | kind | phase | token | next phase | effect |
//! |------|-------|-------|------------|--------|
//! | PageSet | Outside | start `url` | InRecord | reset record |
//! | Index | Outside | start `sitemap` | InRecord | reset record |
//! | any | InRecord | start `loc` (direct child) | InLocation | clear location |
//! | PageSet | InRecord | start `lastmod` (direct child) | InLastModified | clear lastmod |
//! | any | InLocation | text | InLocation | append to location |
//! | any | InLastModified | text | InLastModified | append to lastmod |
//! | any | InLocation | end `loc` | InRecord | resolve location against base |
//! | any | InLastModified | end `lastmod` | InRecord | |
//! | PageSet | InRecord | end `url` | Outside | emit page |
//! | Index | InRecord | end `sitemap` | Outside | record child sitemap |
//!
//! Every other combination leaves the state untouched. Once the page callback
//! returns [`Flow::Stop`] the extractor is ended and ignores all further tokens.

use crate::sitemap::{Flow, Page, XmlToken};
use crate::url::resolve_against;

/// Document classification, decided by the root element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Root element not seen yet, or not a sitemap root
    Unknown,

    /// `<urlset>`: a flat list of pages
    PageSet,

    /// `<sitemapindex>`: a list of child sitemaps
    Index,
}

/// Position inside the current record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Outside,
    InRecord,
    InLocation,
    InLastModified,
}

/// Tag names the extractor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    UrlSet,
    SitemapIndex,
    Url,
    Sitemap,
    Loc,
    LastMod,
    Other,
}

impl Tag {
    fn from_name(name: &str) -> Self {
        const TAGS: [(&str, Tag); 6] = [
            ("urlset", Tag::UrlSet),
            ("sitemapindex", Tag::SitemapIndex),
            ("url", Tag::Url),
            ("sitemap", Tag::Sitemap),
            ("loc", Tag::Loc),
            ("lastmod", Tag::LastMod),
        ];

        TAGS.iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, tag)| *tag)
            .unwrap_or(Tag::Other)
    }
}

/// Streaming extractor state for one document
#[derive(Debug)]
pub struct Extractor {
    base_url: String,
    kind: DocumentKind,
    classified: bool,
    phase: Phase,
    ended: bool,

    /// Element depth of the token being handled (root = 1)
    depth: usize,
    /// Depth of the open `<url>`/`<sitemap>` record
    record_depth: usize,

    location: String,
    record: Page,
    children: Vec<String>,
    pages_emitted: usize,
}

impl Extractor {
    /// Creates an extractor for the document located at `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            kind: DocumentKind::Unknown,
            classified: false,
            phase: Phase::Outside,
            ended: false,
            depth: 0,
            record_depth: 0,
            location: String::new(),
            record: Page::empty(base_url),
            children: Vec::new(),
            pages_emitted: 0,
        }
    }

    /// Feeds one token through the state machine
    ///
    /// Completed page records are handed to `on_page`. When it answers
    /// [`Flow::Stop`] the extractor ends and every later call returns
    /// `Flow::Stop` without looking at the token, so the driver knows to stop
    /// pulling from the source.
    pub fn handle<F>(&mut self, token: XmlToken, on_page: &mut F) -> Flow
    where
        F: FnMut(Page) -> Flow,
    {
        if self.ended {
            return Flow::Stop;
        }

        match token {
            XmlToken::Start(name) => self.open(Tag::from_name(&name)),
            XmlToken::End(name) => return self.close(Tag::from_name(&name), on_page),
            XmlToken::Text(text) => self.text(&text),
        }

        Flow::Continue
    }

    /// The document kind observed so far
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// True once the page callback asked to stop
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Number of page records completed and passed to the sink
    ///
    /// Counts every record, including ones the sink later discards.
    pub fn pages_emitted(&self) -> usize {
        self.pages_emitted
    }

    /// Child sitemap URLs discovered so far, in document order
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Consumes the extractor, returning the discovered child sitemap URLs
    pub fn into_children(self) -> Vec<String> {
        self.children
    }

    fn open(&mut self, tag: Tag) {
        self.depth += 1;

        if !self.classified {
            self.classified = true;
            self.kind = match tag {
                Tag::UrlSet => DocumentKind::PageSet,
                Tag::SitemapIndex => DocumentKind::Index,
                _ => DocumentKind::Unknown,
            };
            return;
        }

        let direct_child = self.depth == self.record_depth + 1;

        self.phase = match (self.kind, self.phase, tag) {
            (DocumentKind::PageSet, Phase::Outside, Tag::Url)
            | (DocumentKind::Index, Phase::Outside, Tag::Sitemap) => {
                self.record = Page::empty(&self.base_url);
                self.record_depth = self.depth;
                Phase::InRecord
            }
            (_, Phase::InRecord, Tag::Loc) if direct_child => {
                self.location.clear();
                Phase::InLocation
            }
            (DocumentKind::PageSet, Phase::InRecord, Tag::LastMod) if direct_child => {
                self.record.last_modified.clear();
                Phase::InLastModified
            }
            (_, phase, _) => phase,
        };
    }

    fn text(&mut self, text: &str) {
        match self.phase {
            Phase::InLocation => self.location.push_str(text),
            Phase::InLastModified => self.record.last_modified.push_str(text),
            Phase::Outside | Phase::InRecord => {}
        }
    }

    fn close<F>(&mut self, tag: Tag, on_page: &mut F) -> Flow
    where
        F: FnMut(Page) -> Flow,
    {
        let depth = self.depth;
        self.depth = self.depth.saturating_sub(1);

        let at_record = depth == self.record_depth;
        let direct_child = depth == self.record_depth + 1;

        match (self.kind, self.phase, tag) {
            (_, Phase::InLocation, Tag::Loc) if direct_child => {
                self.record.url = resolve_against(&self.base_url, &self.location);
                self.phase = Phase::InRecord;
            }
            (_, Phase::InLastModified, Tag::LastMod) if direct_child => {
                self.phase = Phase::InRecord;
            }
            (DocumentKind::PageSet, Phase::InRecord, Tag::Url) if at_record => {
                self.phase = Phase::Outside;
                let page = std::mem::replace(&mut self.record, Page::empty(&self.base_url));
                self.pages_emitted += 1;
                if on_page(page).is_stop() {
                    self.ended = true;
                    return Flow::Stop;
                }
            }
            (DocumentKind::Index, Phase::InRecord, Tag::Sitemap) if at_record => {
                self.phase = Phase::Outside;
                let child = std::mem::take(&mut self.record.url);
                if child.is_empty() {
                    tracing::debug!("{}: skipping index entry without <loc>", self.base_url);
                } else {
                    self.children.push(child);
                }
            }
            _ => {}
        }

        Flow::Continue
    }
}
