use mammoth_core::CancellationToken;
use mammoth_pager::PageProvider;

use crate::frame::FrameSearcher;
use crate::walker::{plan_walk, FrameWalker};
use crate::{Result, SearchDirection, SearchError, SearchResult, SearchTaskId, SearchTaskOptions};

/// Receives the lifecycle of a [`CloseSearchTask`].
///
/// All methods run synchronously on the task's thread; implementations that
/// need another thread (a UI, an event loop) redispatch themselves. Exactly
/// one of the terminal methods (`closest_result_found`, `search_finished`,
/// `search_stopped`, `search_failed`) fires per run.
pub trait CloseSearchCallback: Send {
    /// Fired once per page, just before that page is searched.
    fn search_progress(&self, task: SearchTaskId, page_number: u64, pages_total: u64) {
        let _ = (task, page_number, pages_total);
    }

    /// The closest qualifying match was found. `frame_matches` holds every
    /// match of the winning frame in document order and `closest` indexes
    /// the winner, so the embedder can also populate nearby occurrences.
    fn closest_result_found(&self, task: SearchTaskId, frame_matches: &[SearchResult], closest: usize);

    /// The planned page range was exhausted without a qualifying match.
    /// `last_scanned_page` is `None` when there was nothing to scan.
    fn search_finished(&self, task: SearchTaskId, last_scanned_page: Option<u64>);

    /// A stop request was observed between pages.
    fn search_stopped(&self, task: SearchTaskId, page_number: u64);

    /// A page could not be fetched; the run ends without retrying.
    fn search_failed(&self, task: SearchTaskId, error: &SearchError);
}

enum CloseOutcome {
    Found {
        frame_matches: Vec<SearchResult>,
        closest: usize,
    },
    Exhausted(Option<u64>),
    Stopped(u64),
    Failed(SearchError),
}

/// Finds the single match closest to a position, scanning page by page in
/// the requested direction.
///
/// Forward tasks start at the left bound's page and report the first
/// qualifying match in document order; backward tasks start at the right
/// bound's page and report the last. The task stops at the first frame
/// containing a qualifying match, so only the pages between the start and
/// that frame are ever fetched.
///
/// The task trusts its options; see [`SearchTaskOptions::validate`] for the
/// construction-side checks.
pub struct CloseSearchTask<P, C> {
    id: SearchTaskId,
    options: SearchTaskOptions,
    provider: P,
    callback: C,
    token: CancellationToken,
    searcher: FrameSearcher,
}

impl<P: PageProvider, C: CloseSearchCallback> CloseSearchTask<P, C> {
    /// Compiles the query eagerly; a malformed pattern is returned here
    /// rather than reported to the callback.
    pub fn new(options: SearchTaskOptions, provider: P, callback: C) -> Result<Self> {
        let searcher = FrameSearcher::new(options.clone())?;
        Ok(Self {
            id: SearchTaskId::next(),
            options,
            provider,
            callback,
            token: CancellationToken::new(),
            searcher,
        })
    }

    pub fn id(&self) -> SearchTaskId {
        self.id
    }

    /// Shared stop flag for this run. Cancelling it makes the task wind down
    /// at the next page boundary.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Replaces the task's stop flag, letting several collaborators share
    /// one.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Runs the task to a terminal state on the calling thread, firing
    /// exactly one terminal callback.
    pub fn run(mut self) {
        tracing::debug!(
            target: "mammoth.search",
            task = %self.id,
            source = self.provider.name(),
            direction = ?self.options.direction,
            "close search started"
        );
        match self.execute() {
            CloseOutcome::Found {
                frame_matches,
                closest,
            } => {
                tracing::debug!(
                    target: "mammoth.search",
                    task = %self.id,
                    page_number = frame_matches[closest].start.page_number,
                    offset = frame_matches[closest].start.offset,
                    "closest match found"
                );
                self.callback
                    .closest_result_found(self.id, &frame_matches, closest);
            }
            CloseOutcome::Exhausted(last_scanned_page) => {
                tracing::debug!(
                    target: "mammoth.search",
                    task = %self.id,
                    last_scanned_page,
                    "close search exhausted its range"
                );
                self.callback.search_finished(self.id, last_scanned_page);
            }
            CloseOutcome::Stopped(page_number) => {
                tracing::debug!(
                    target: "mammoth.search",
                    task = %self.id,
                    page_number,
                    "close search stopped"
                );
                self.callback.search_stopped(self.id, page_number);
            }
            CloseOutcome::Failed(error) => {
                tracing::warn!(
                    target: "mammoth.search",
                    task = %self.id,
                    error = %error,
                    "close search failed"
                );
                self.callback.search_failed(self.id, &error);
            }
        }
    }

    fn execute(&mut self) -> CloseOutcome {
        let pages_total = match self.provider.page_count() {
            Ok(count) => count,
            Err(err) => return CloseOutcome::Failed(err.into()),
        };
        let Some(plan) = plan_walk(&self.options, pages_total) else {
            return CloseOutcome::Exhausted(None);
        };
        let mut walker =
            match FrameWalker::create(&self.provider, &mut self.searcher, plan, pages_total) {
                Ok(walker) => walker,
                Err(err) => return CloseOutcome::Failed(err),
            };
        loop {
            if self.token.is_cancelled() {
                return CloseOutcome::Stopped(walker.current_page());
            }
            self.callback
                .search_progress(self.id, walker.current_page(), pages_total);
            let frame_matches = walker.search_frame();
            if let Some(closest) = closest_in_frame(&self.options, &frame_matches) {
                return CloseOutcome::Found {
                    frame_matches,
                    closest,
                };
            }
            match walker.advance() {
                Ok(true) => {}
                Ok(false) => {
                    // A stop observed at the natural end of the range wins
                    // over plain exhaustion.
                    if self.token.is_cancelled() {
                        return CloseOutcome::Stopped(walker.current_page());
                    }
                    return CloseOutcome::Exhausted(Some(walker.current_page()));
                }
                Err(err) => return CloseOutcome::Failed(err),
            }
        }
    }
}

/// Index of the frame match nearest to the caret in the walk direction:
/// the first in-bounds match for forward searches, the last for backward.
fn closest_in_frame(options: &SearchTaskOptions, frame_matches: &[SearchResult]) -> Option<usize> {
    match options.direction {
        SearchDirection::Forward => frame_matches
            .iter()
            .position(|m| options.is_within_bounds(m.start, m.end)),
        SearchDirection::Backward => frame_matches
            .iter()
            .rposition(|m| options.is_within_bounds(m.start, m.end)),
    }
}
