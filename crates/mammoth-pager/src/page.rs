use std::sync::Arc;

/// One page of a paged document: a page number plus its decoded UTF-8 text.
///
/// Pages are contiguous and non-overlapping. Concatenating the text of every
/// page of a provider, in page order, reproduces the full document.
///
/// The text is reference-counted so a page can sit in a cache and in a search
/// window at the same time without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    page_number: u64,
    text: Arc<str>,
    last: bool,
}

impl Page {
    pub fn new(page_number: u64, text: impl Into<Arc<str>>, last: bool) -> Self {
        Self {
            page_number,
            text: text.into(),
            last,
        }
    }

    pub fn page_number(&self) -> u64 {
        self.page_number
    }

    /// Decoded page text. May be empty in degenerate pagings (for example a
    /// page whose raw bytes all continue a character owned by the previous
    /// page).
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn text_arc(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    /// Length of the decoded text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether this is the final page of the document.
    pub fn is_last(&self) -> bool {
        self.last
    }
}
