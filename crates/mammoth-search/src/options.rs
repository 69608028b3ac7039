use mammoth_core::PagePosition;
use serde::{Deserialize, Serialize};

use crate::OptionsError;

/// Direction of a search relative to document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchDirection {
    Forward,
    Backward,
}

impl SearchDirection {
    pub fn is_forward(self) -> bool {
        matches!(self, SearchDirection::Forward)
    }
}

/// Characters of context captured on each side of a match by default.
pub const DEFAULT_CONTEXT_CHARS: usize = 10;

/// Default safety cap on the number of results a range search may stream.
pub const DEFAULT_RESULT_CAP: usize = 1000;

/// Parameter object threaded through every search task.
///
/// Options are plain data: cloned into a task at construction and never
/// mutated mid-run, so a single run never observes two different option
/// sets. Tasks trust their options; [`SearchTaskOptions::validate`] is for
/// the collaborator that builds them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTaskOptions {
    /// Literal text or, when [`Self::regex`] is set, a regex pattern.
    pub query: String,
    pub direction: SearchDirection,
    pub case_sensitive: bool,
    /// Reject matches whose neighboring characters are word characters
    /// (alphanumeric or `_`).
    pub whole_words: bool,
    /// Interpret [`Self::query`] as a regex instead of a literal.
    pub regex: bool,
    /// Matches must start at or after this position.
    pub left_bound: Option<PagePosition>,
    /// Matches must end at or before this position.
    pub right_bound: Option<PagePosition>,
    /// Characters of context captured on each side of a match.
    pub context_chars: usize,
    /// Safety cap on streamed results, `None` for unlimited. Enforced by the
    /// session, not by the task itself.
    pub result_cap: Option<usize>,
}

impl SearchTaskOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            direction: SearchDirection::Forward,
            case_sensitive: false,
            whole_words: false,
            regex: false,
            left_bound: None,
            right_bound: None,
            context_chars: DEFAULT_CONTEXT_CHARS,
            result_cap: Some(DEFAULT_RESULT_CAP),
        }
    }

    pub fn forward(self) -> Self {
        self.with_direction(SearchDirection::Forward)
    }

    pub fn backward(self) -> Self {
        self.with_direction(SearchDirection::Backward)
    }

    pub fn with_direction(mut self, direction: SearchDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_whole_words(mut self, whole_words: bool) -> Self {
        self.whole_words = whole_words;
        self
    }

    pub fn with_regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    pub fn with_left_bound(mut self, bound: PagePosition) -> Self {
        self.left_bound = Some(bound);
        self
    }

    pub fn with_right_bound(mut self, bound: PagePosition) -> Self {
        self.right_bound = Some(bound);
        self
    }

    pub fn with_context_chars(mut self, context_chars: usize) -> Self {
        self.context_chars = context_chars;
        self
    }

    pub fn with_result_cap(mut self, result_cap: Option<usize>) -> Self {
        self.result_cap = result_cap;
        self
    }

    /// Checks the options for internal contradictions.
    pub fn validate(&self) -> std::result::Result<(), OptionsError> {
        if self.query.is_empty() {
            return Err(OptionsError::EmptyQuery);
        }
        if let (Some(left), Some(right)) = (self.left_bound, self.right_bound) {
            if left > right {
                return Err(OptionsError::ContradictoryBounds { left, right });
            }
        }
        if self.result_cap == Some(0) {
            return Err(OptionsError::ZeroResultCap);
        }
        Ok(())
    }

    /// Whether a match spanning `start..end` qualifies under the optional
    /// bounds: it must start at or after the left bound and end at or before
    /// the right bound, regardless of search direction.
    pub fn is_within_bounds(&self, start: PagePosition, end: PagePosition) -> bool {
        self.left_bound.map_or(true, |left| start >= left)
            && self.right_bound.map_or(true, |right| end <= right)
    }
}
