//! Pull-based XML tokenizer
//!
//! Wraps quick-xml's async reader and reduces its event stream to the three
//! token kinds the extractor cares about. Tag names are lowercased local names,
//! whitespace-only text is dropped, CDATA is delivered as text and self-closing
//! elements produce a start token followed by an end token.

use crate::SitemapError;
use quick_xml::events::Event;
use quick_xml::Reader;
use tokio::io::AsyncBufRead;

/// A single token of an XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlToken {
    /// Element start, lowercased local name
    Start(String),

    /// Element end, lowercased local name
    End(String),

    /// Non-empty, trimmed, unescaped character data
    Text(String),
}

/// Outcome of reading one raw event
enum Step {
    Token(XmlToken),
    SelfClosing(String),
    Skip,
    Eof,
    Failed(quick_xml::Error),
}

/// Incremental tokenizer over one document's byte source
pub struct Tokenizer<R> {
    url: String,
    reader: Reader<R>,
    buf: Vec<u8>,
    pending_end: Option<String>,

    /// Elements opened and not yet closed
    open_elements: usize,
}

impl<R: AsyncBufRead + Unpin> Tokenizer<R> {
    /// Creates a tokenizer for the document at `url` reading from `source`
    pub fn new(url: &str, source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);

        Self {
            url: url.to_string(),
            reader,
            buf: Vec::new(),
            pending_end: None,
            open_elements: 0,
        }
    }

    /// Pulls the next token from the source
    ///
    /// # Returns
    ///
    /// * `Ok(Some(XmlToken))` - The next token in document order
    /// * `Ok(None)` - End of document
    /// * `Err(SitemapError::Parse)` - Malformed XML, including a document that
    ///   ends while elements are still open
    /// * `Err(SitemapError::Io)` - The underlying stream failed
    pub async fn next_token(&mut self) -> Result<Option<XmlToken>, SitemapError> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Some(XmlToken::End(name)));
        }

        loop {
            self.buf.clear();
            let result = self.reader.read_event_into_async(&mut self.buf).await;
            let step = match result {
                Ok(event) => convert(event),
                Err(e) => Step::Failed(e),
            };

            match step {
                Step::Token(token) => {
                    match &token {
                        XmlToken::Start(_) => self.open_elements += 1,
                        XmlToken::End(_) => {
                            self.open_elements = self.open_elements.saturating_sub(1)
                        }
                        XmlToken::Text(_) => {}
                    }
                    tracing::trace!("{}: {:?}", self.url, token);
                    return Ok(Some(token));
                }
                Step::SelfClosing(name) => {
                    self.pending_end = Some(name.clone());
                    return Ok(Some(XmlToken::Start(name)));
                }
                Step::Skip => continue,
                Step::Eof if self.open_elements > 0 => {
                    return Err(SitemapError::Parse {
                        url: self.url.clone(),
                        message: format!(
                            "unexpected end of document, {} unclosed element(s)",
                            self.open_elements
                        ),
                    });
                }
                Step::Eof => return Ok(None),
                Step::Failed(error) => return Err(self.classify(error)),
            }
        }
    }

    /// Gives back the byte source so the caller can close it
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    fn classify(&self, error: quick_xml::Error) -> SitemapError {
        match error {
            quick_xml::Error::Io(io) => SitemapError::Io {
                url: self.url.clone(),
                message: io.to_string(),
            },
            other => SitemapError::Parse {
                url: self.url.clone(),
                message: format!("{} (at byte {})", other, self.reader.buffer_position()),
            },
        }
    }
}

fn convert(event: Event<'_>) -> Step {
    match event {
        Event::Start(start) => Step::Token(XmlToken::Start(tag_name(start.local_name().as_ref()))),
        Event::Empty(start) => Step::SelfClosing(tag_name(start.local_name().as_ref())),
        Event::End(end) => Step::Token(XmlToken::End(tag_name(end.local_name().as_ref()))),
        Event::Text(text) => match text.unescape() {
            Ok(content) => text_token(&content),
            Err(e) => Step::Failed(e.into()),
        },
        Event::CData(data) => text_token(&String::from_utf8_lossy(&data)),
        Event::Eof => Step::Eof,
        _ => Step::Skip,
    }
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn text_token(content: &str) -> Step {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Step::Skip
    } else {
        Step::Token(XmlToken::Text(trimmed.to_string()))
    }
}
