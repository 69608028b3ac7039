use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::cache::PageCache;
use crate::{Page, PageProvider, PagerError, Result};

pub const DEFAULT_PAGE_SIZE: usize = 64 * 1024;
pub const DEFAULT_CACHE_BUDGET_BYTES: usize = 32 * 1024 * 1024;

/// Smallest raw page size [`FilePager`] will honor. Pages must be able to
/// hold at least a few full characters for boundary reconstruction to work.
const MIN_PAGE_SIZE: usize = 16;

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_cache_budget_bytes() -> usize {
    DEFAULT_CACHE_BUDGET_BYTES
}

/// Configuration for [`FilePager`]. Unknown sizes fall back to defaults when
/// deserialized from an embedder's config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerConfig {
    /// Raw page size in bytes. Values below 16 are clamped. Page boundaries
    /// are fixed byte offsets into the file; the decoded text of a page may
    /// be a few bytes longer or shorter because a character belongs to the
    /// page its first byte falls in.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Byte budget for the decoded-page LRU cache. Zero disables caching.
    #[serde(default = "default_cache_budget_bytes")]
    pub cache_budget_bytes: usize,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            cache_budget_bytes: default_cache_budget_bytes(),
        }
    }
}

/// File-backed [`PageProvider`] over a UTF-8 text file.
///
/// The file is split into fixed `page_size` byte ranges. A character belongs
/// to the page containing its first byte: a character straddling a raw
/// boundary is decoded into the earlier page, and the later page's text
/// starts at the next character-initial byte. Concatenating all page texts
/// reproduces the file exactly.
///
/// The file length is captured at open time and the pager serves an
/// immutable snapshot of that prefix; bytes appended later are never read.
#[derive(Debug)]
pub struct FilePager {
    name: String,
    file: Mutex<File>,
    len: u64,
    page_size: usize,
    page_count: u64,
    cache: PageCache,
}

impl FilePager {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(path, PagerConfig::default())
    }

    pub fn with_config(path: impl AsRef<Path>, config: PagerConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let page_size = config.page_size.max(MIN_PAGE_SIZE);
        let page_count = len.div_ceil(page_size as u64);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        tracing::debug!(
            target: "mammoth.pager",
            name = %name,
            len,
            page_size,
            page_count,
            "opened file pager"
        );
        Ok(Self {
            name,
            file: Mutex::new(file),
            len,
            page_size,
            page_count,
            cache: PageCache::new(config.cache_budget_bytes),
        })
    }

    /// Snapshot length of the file in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Bytes currently held by the decoded-page cache.
    pub fn estimated_cache_bytes(&self) -> usize {
        self.cache.estimated_bytes()
    }

    fn read_raw(&self, start: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut file = self.lock_file();
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    #[track_caller]
    fn lock_file(&self) -> MutexGuard<'_, File> {
        match self.file.lock() {
            Ok(guard) => guard,
            Err(err) => {
                let location = std::panic::Location::caller();
                tracing::error!(
                    target: "mammoth.pager",
                    file = location.file(),
                    line = location.line(),
                    error = %err,
                    "file mutex poisoned; continuing with recovered guard"
                );
                err.into_inner()
            }
        }
    }
}

impl PageProvider for FilePager {
    fn page_count(&self) -> Result<u64> {
        Ok(self.page_count)
    }

    fn read_page(&self, page_number: u64) -> Result<Page> {
        if page_number >= self.page_count {
            return Err(PagerError::PageOutOfRange {
                page_number,
                page_count: self.page_count,
            });
        }
        let last = page_number + 1 == self.page_count;
        if let Some(text) = self.cache.get(page_number) {
            tracing::trace!(target: "mammoth.pager", page_number, "page cache hit");
            return Ok(Page::new(page_number, text, last));
        }
        let start = page_number * self.page_size as u64;
        let raw_len = (self.len - start).min(self.page_size as u64) as usize;
        // Up to three extra bytes cover a character whose first byte lands in
        // this page but whose tail spills into the next one.
        let slack_len = (self.len - start).min(raw_len as u64 + 3) as usize;
        let buf = self.read_raw(start, slack_len)?;
        let text = decode_page(&buf, raw_len, page_number)?;
        let text: Arc<str> = Arc::from(text);
        self.cache.insert(page_number, Arc::clone(&text));
        tracing::trace!(
            target: "mammoth.pager",
            page_number,
            bytes = text.len(),
            "decoded page"
        );
        Ok(Page::new(page_number, text, last))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

fn utf8_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        _ => None,
    }
}

/// Decodes the text a page owns from its raw bytes.
///
/// `buf` holds the page's `raw_len` bytes plus up to three slack bytes from
/// the next raw page. Leading continuation bytes belong to the previous
/// page's final character and are skipped; the final character starting
/// inside the raw range is decoded in full, even when it ends in the slack.
fn decode_page(buf: &[u8], raw_len: usize, page_number: u64) -> Result<String> {
    debug_assert!(raw_len > 0 && raw_len <= buf.len());
    let invalid = || PagerError::InvalidUtf8 { page_number };

    let mut skip = 0usize;
    while skip < buf.len() && is_continuation(buf[skip]) {
        skip += 1;
        if skip > 3 {
            return Err(invalid());
        }
    }
    if skip > 0 && page_number == 0 {
        // The file itself starts mid-character.
        return Err(invalid());
    }
    if skip >= raw_len {
        // Every raw byte continues a character owned by the previous page.
        return Ok(String::new());
    }

    let mut last_start = raw_len - 1;
    while last_start > skip && is_continuation(buf[last_start]) {
        last_start -= 1;
    }
    let char_len = utf8_len(buf[last_start]).ok_or_else(invalid)?;
    let end = last_start + char_len;
    if end < raw_len || end > buf.len() {
        // More continuation bytes than the lead allows, or the file ends
        // mid-character.
        return Err(invalid());
    }
    let text = std::str::from_utf8(&buf[skip..end]).map_err(|_| invalid())?;
    Ok(text.to_owned())
}
