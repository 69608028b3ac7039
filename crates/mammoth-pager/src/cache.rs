use std::sync::{Arc, Mutex, MutexGuard};

use lru::LruCache;

/// Thread-safe LRU cache of decoded page texts, bounded by a byte budget.
///
/// Byte accounting uses the UTF-8 length of the cached text. Inserting past
/// the budget evicts least-recently-used pages until the total fits again. A
/// budget of zero stores nothing, and a single text larger than the whole
/// budget is never admitted.
#[derive(Debug)]
pub(crate) struct PageCache {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    max_bytes: usize,
    total_bytes: usize,
    entries: LruCache<u64, Arc<str>>,
}

impl PageCache {
    pub(crate) fn new(max_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                max_bytes,
                total_bytes: 0,
                entries: LruCache::unbounded(),
            }),
        }
    }

    pub(crate) fn get(&self, page_number: u64) -> Option<Arc<str>> {
        let mut inner = self.lock_inner();
        inner.entries.get(&page_number).cloned()
    }

    pub(crate) fn insert(&self, page_number: u64, text: Arc<str>) {
        let bytes = text.len();
        let mut inner = self.lock_inner();
        if inner.max_bytes == 0 || bytes > inner.max_bytes {
            // Uncacheable. Drop any stale entry for the same page so we never
            // serve an outdated text.
            if let Some(previous) = inner.entries.pop(&page_number) {
                inner.total_bytes = inner.total_bytes.saturating_sub(previous.len());
            }
            return;
        }
        if let Some(previous) = inner.entries.put(page_number, text) {
            inner.total_bytes = inner.total_bytes.saturating_sub(previous.len());
        }
        inner.total_bytes = inner.total_bytes.saturating_add(bytes);
        while inner.total_bytes > inner.max_bytes {
            let Some((evicted_page, evicted)) = inner.entries.pop_lru() else {
                inner.total_bytes = 0;
                break;
            };
            inner.total_bytes = inner.total_bytes.saturating_sub(evicted.len());
            tracing::trace!(
                target: "mammoth.pager",
                page_number = evicted_page,
                bytes = evicted.len(),
                "evicted page from cache"
            );
        }
    }

    /// Current number of cached bytes. Approximate by design: it counts text
    /// payloads only, not map overhead.
    pub(crate) fn estimated_bytes(&self) -> usize {
        self.lock_inner().total_bytes
    }

    #[track_caller]
    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(err) => {
                let location = std::panic::Location::caller();
                tracing::error!(
                    target: "mammoth.pager",
                    file = location.file(),
                    line = location.line(),
                    error = %err,
                    "page cache mutex poisoned; continuing with recovered guard"
                );
                err.into_inner()
            }
        }
    }
}
