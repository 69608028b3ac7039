use mammoth_core::PagePosition;
use serde::{Deserialize, Serialize};

/// A single match found by a search task.
///
/// `start` is the position of the match's first byte. `end` is exclusive and
/// expressed in the page holding the match's final character: a match that
/// runs to the very end of page N ends at `(N, page_len)`, never at
/// `(N + 1, 0)`. A match may straddle one page boundary, in which case it is
/// attributed to its start page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub start: PagePosition,
    pub end: PagePosition,
    /// The matched text itself.
    pub matched: String,
    /// Characters immediately before the match, innermost last.
    pub context_prefix: String,
    /// Characters immediately after the match, innermost first.
    pub context_postfix: String,
}

impl SearchResult {
    /// The page this match is attributed to.
    pub fn page_number(&self) -> u64 {
        self.start.page_number
    }

    /// Whether the match crosses from its start page into the next one.
    pub fn straddles_pages(&self) -> bool {
        self.end.page_number != self.start.page_number
    }
}
