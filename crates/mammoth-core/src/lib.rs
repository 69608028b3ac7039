//! Core vocabulary types shared across the Mammoth crates.
//!
//! This crate is intentionally small: positions in a paged document and the
//! cooperative cancellation flag that every long-running task polls. Anything
//! heavier lives in `mammoth-pager` or `mammoth-search`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A location in a paged document: the page number plus the byte offset into
/// that page's decoded UTF-8 text.
///
/// Offsets always lie on a character boundary. The derived ordering is
/// document order: by page number first, then by offset within the page.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct PagePosition {
    pub page_number: u64,
    pub offset: usize,
}

impl PagePosition {
    #[inline]
    pub const fn new(page_number: u64, offset: usize) -> Self {
        Self {
            page_number,
            offset,
        }
    }
}

impl fmt::Display for PagePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.page_number, self.offset)
    }
}

/// Cooperative cancellation flag shared between a task and its controllers.
///
/// Cancellation is advisory. Tasks poll the token at safe points (between
/// pages) and wind down on their own; nothing ever interrupts or kills a task
/// thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
