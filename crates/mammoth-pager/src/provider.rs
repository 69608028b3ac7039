use std::sync::Arc;

use crate::{Page, PagerError, Result};

/// Paged, read-only access to a large document.
///
/// The trait is deliberately small so it can back very different sources:
/// local files ([`crate::FilePager`]), in-memory documents ([`MemoryPager`]),
/// or a remote host bridged by an embedder. Implementations must be
/// snapshot-stable: for the lifetime of the provider, the same page number
/// always yields the same text, and `page_count` does not change.
pub trait PageProvider: Send + Sync {
    /// Total number of pages in the document. An empty document has zero
    /// pages.
    fn page_count(&self) -> Result<u64>;

    /// Reads one page, blocking the calling thread until the page is
    /// available. Requests outside `0..page_count()` fail with
    /// [`PagerError::PageOutOfRange`].
    fn read_page(&self, page_number: u64) -> Result<Page>;

    /// Human-readable label for logs and progress reporting.
    fn name(&self) -> &str;
}

impl<P: PageProvider + ?Sized> PageProvider for Arc<P> {
    fn page_count(&self) -> Result<u64> {
        (**self).page_count()
    }

    fn read_page(&self, page_number: u64) -> Result<Page> {
        (**self).read_page(page_number)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// In-memory [`PageProvider`] over a fixed string.
///
/// Useful for virtual documents and tests. Pages can be derived from a byte
/// budget (never splitting a character) or supplied verbatim to reproduce a
/// specific paging.
#[derive(Debug, Clone)]
pub struct MemoryPager {
    name: Arc<str>,
    pages: Arc<[Arc<str>]>,
}

impl MemoryPager {
    /// Splits `text` into fixed `page_size` byte ranges using the same
    /// ownership rule as [`crate::FilePager`]: a character belongs to the page
    /// containing its first byte. A `page_size` of zero is treated as one.
    pub fn new(text: &str, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let page_count = text.len().div_ceil(page_size);
        let mut pages = vec![String::new(); page_count];
        for (byte_idx, ch) in text.char_indices() {
            pages[byte_idx / page_size].push(ch);
        }
        let pages: Vec<Arc<str>> = pages.into_iter().map(|p| Arc::from(p.as_str())).collect();
        Self {
            name: Arc::from("memory"),
            pages: pages.into(),
        }
    }

    /// Builds a pager from explicit page texts.
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pages: Vec<Arc<str>> = pages.into_iter().map(|p| Arc::from(p.as_ref())).collect();
        Self {
            name: Arc::from("memory"),
            pages: pages.into(),
        }
    }

    pub fn named(mut self, name: impl AsRef<str>) -> Self {
        self.name = Arc::from(name.as_ref());
        self
    }
}

impl PageProvider for MemoryPager {
    fn page_count(&self) -> Result<u64> {
        Ok(self.pages.len() as u64)
    }

    fn read_page(&self, page_number: u64) -> Result<Page> {
        let count = self.pages.len() as u64;
        let Some(text) = usize::try_from(page_number)
            .ok()
            .and_then(|idx| self.pages.get(idx))
        else {
            return Err(PagerError::PageOutOfRange {
                page_number,
                page_count: count,
            });
        };
        Ok(Page::new(
            page_number,
            Arc::clone(text),
            page_number + 1 == count,
        ))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
