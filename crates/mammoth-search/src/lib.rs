//! Paginated search over documents served by `mammoth-pager`.
//!
//! Documents too large to hold in memory are searched through a sliding
//! window of pages. For each page N the [`FrameSearcher`] sees the frame
//! `[prefix symbol][page N][page N + 1][postfix symbol]`, where the symbols
//! are the single characters adjacent to the window. The symbols give
//! word-boundary checks and regex line anchors truthful context at page
//! splits without widening the window, and matches are partitioned by their
//! start page so each one is reported exactly once.
//!
//! Two tasks drive the window: [`CloseSearchTask`] finds the match closest
//! to a position in a given direction and stops, while [`RangeSearchTask`]
//! streams every match frame by frame. Both run to a terminal state on a
//! single thread, report through a callback trait, and honor cooperative
//! stop requests between pages. [`SearchSession`] owns the thread for the
//! common one-search-per-document arrangement, and [`EventSender`] adapts
//! the callbacks onto a channel.

mod close;
mod error;
mod events;
mod frame;
mod matcher;
mod options;
mod range;
mod result;
mod session;
mod task;
mod walker;

pub use close::{CloseSearchCallback, CloseSearchTask};
pub use error::{OptionsError, Result, SearchError};
pub use events::{EventSender, SearchEvent};
pub use frame::FrameSearcher;
pub use options::{
    SearchDirection, SearchTaskOptions, DEFAULT_CONTEXT_CHARS, DEFAULT_RESULT_CAP,
};
pub use range::{RangeSearchCallback, RangeSearchTask};
pub use result::SearchResult;
pub use session::SearchSession;
pub use task::SearchTaskId;

pub use mammoth_core::{CancellationToken, PagePosition};
