use mammoth_core::PagePosition;
use mammoth_pager::PagerError;

pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors surfaced when constructing or running a search.
///
/// Construction problems (bad options, a pattern that does not compile,
/// a thread that cannot be spawned) are returned to the caller; errors hit
/// while a task is running reach its callback as `search_failed` instead.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid search options: {0}")]
    Options(#[from] OptionsError),

    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Pager(#[from] PagerError),

    #[error("failed to spawn search thread: {0}")]
    TaskSpawn(#[source] std::io::Error),
}

/// Contradictions in [`crate::SearchTaskOptions`].
///
/// Running tasks trust their options; this validation belongs to whichever
/// collaborator builds them. [`crate::SearchSession`] runs it before
/// spawning a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("search string is empty")]
    EmptyQuery,

    #[error("left bound {left} is beyond right bound {right}")]
    ContradictoryBounds {
        left: PagePosition,
        right: PagePosition,
    },

    #[error("result cap must be at least one")]
    ZeroResultCap,
}
