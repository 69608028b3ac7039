//! Paged access to very large text documents.
//!
//! A [`PageProvider`] carves a document into fixed-size pages of decoded
//! UTF-8 text so consumers can work on files far larger than memory one
//! window at a time. [`FilePager`] serves local files with an LRU cache of
//! decoded pages and [`MemoryPager`] serves in-memory text; [`TimedPager`]
//! wraps any provider so a stalled read turns into a
//! [`PagerError::Timeout`] instead of an unbounded wait.

mod cache;
mod error;
mod fetch;
mod file;
mod page;
mod provider;

pub use error::{PagerError, Result};
pub use fetch::{PageFetcher, PendingPage, TimedPager};
pub use file::{FilePager, PagerConfig, DEFAULT_CACHE_BUDGET_BYTES, DEFAULT_PAGE_SIZE};
pub use page::Page;
pub use provider::{MemoryPager, PageProvider};
