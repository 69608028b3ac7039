use mammoth_core::CancellationToken;
use mammoth_pager::PageProvider;

use crate::frame::FrameSearcher;
use crate::walker::{plan_walk, FrameWalker};
use crate::{Result, SearchError, SearchResult, SearchTaskId, SearchTaskOptions};

/// Receives the lifecycle of a [`RangeSearchTask`].
///
/// All methods run synchronously on the task's thread. Exactly one of the
/// terminal methods (`search_finished`, `search_stopped`, `search_failed`)
/// fires per run; `frame_results_found` may fire any number of times before
/// it.
pub trait RangeSearchCallback: Send {
    /// Fired once per page, just before that page is searched.
    fn search_progress(&self, task: SearchTaskId, page_number: u64, pages_total: u64) {
        let _ = (task, page_number, pages_total);
    }

    /// The in-bounds matches of one frame, in document order. Fired only for
    /// frames that produced at least one match.
    fn frame_results_found(&self, task: SearchTaskId, page_number: u64, matches: Vec<SearchResult>);

    /// The planned page range was exhausted. `last_scanned_page` is `None`
    /// when there was nothing to scan.
    fn search_finished(&self, task: SearchTaskId, last_scanned_page: Option<u64>);

    /// A stop request was observed between pages.
    fn search_stopped(&self, task: SearchTaskId, page_number: u64);

    /// A page could not be fetched; the run ends without retrying.
    fn search_failed(&self, task: SearchTaskId, error: &SearchError);
}

enum RangeOutcome {
    Exhausted(Option<u64>),
    Stopped(u64),
    Failed(SearchError),
}

/// Streams every in-bounds match of the document, page by page.
///
/// Matches are delivered in batches of one frame each, as soon as the frame
/// has been searched, so consumers see results long before a large file has
/// been fully scanned. Forward tasks stream frames in document order;
/// backward tasks stream them in reverse page order (matches within a frame
/// stay in document order either way).
///
/// Besides its own stop flag the task can poll an embedder-provided token,
/// typically wired to a host progress indicator.
pub struct RangeSearchTask<P, C> {
    id: SearchTaskId,
    options: SearchTaskOptions,
    provider: P,
    callback: C,
    token: CancellationToken,
    external_token: Option<CancellationToken>,
    searcher: FrameSearcher,
}

impl<P: PageProvider, C: RangeSearchCallback> RangeSearchTask<P, C> {
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
            external_token: None,
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

    /// Attaches a second stop flag polled between pages, typically the
    /// embedder's progress indicator.
    pub fn with_external_token(mut self, token: CancellationToken) -> Self {
        self.external_token = Some(token);
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
            "range search started"
        );
        match self.execute() {
            RangeOutcome::Exhausted(last_scanned_page) => {
                tracing::debug!(
                    target: "mammoth.search",
                    task = %self.id,
                    last_scanned_page,
                    "range search exhausted its range"
                );
                self.callback.search_finished(self.id, last_scanned_page);
            }
            RangeOutcome::Stopped(page_number) => {
                tracing::debug!(
                    target: "mammoth.search",
                    task = %self.id,
                    page_number,
                    "range search stopped"
                );
                self.callback.search_stopped(self.id, page_number);
            }
            RangeOutcome::Failed(error) => {
                tracing::warn!(
                    target: "mammoth.search",
                    task = %self.id,
                    error = %error,
                    "range search failed"
                );
                self.callback.search_failed(self.id, &error);
            }
        }
    }

    fn execute(&mut self) -> RangeOutcome {
        let pages_total = match self.provider.page_count() {
            Ok(count) => count,
            Err(err) => return RangeOutcome::Failed(err.into()),
        };
        let Some(plan) = plan_walk(&self.options, pages_total) else {
            return RangeOutcome::Exhausted(None);
        };
        let mut walker =
            match FrameWalker::create(&self.provider, &mut self.searcher, plan, pages_total) {
                Ok(walker) => walker,
                Err(err) => return RangeOutcome::Failed(err),
            };
        loop {
            if stop_requested(&self.token, self.external_token.as_ref()) {
                return RangeOutcome::Stopped(walker.current_page());
            }
            self.callback
                .search_progress(self.id, walker.current_page(), pages_total);
            let matches: Vec<SearchResult> = walker
                .search_frame()
                .into_iter()
                .filter(|m| self.options.is_within_bounds(m.start, m.end))
                .collect();
            if !matches.is_empty() {
                self.callback
                    .frame_results_found(self.id, walker.current_page(), matches);
            }
            match walker.advance() {
                Ok(true) => {}
                Ok(false) => {
                    // A stop observed at the natural end of the range still
                    // wins, so a cap-stopped run never reports `finished`.
                    if stop_requested(&self.token, self.external_token.as_ref()) {
                        return RangeOutcome::Stopped(walker.current_page());
                    }
                    return RangeOutcome::Exhausted(Some(walker.current_page()));
                }
                Err(err) => return RangeOutcome::Failed(err),
            }
        }
    }
}

/// Polls the task's own stop flag and the embedder's, borrowing only the
/// token fields so the walker can keep its hold on the frame searcher.
fn stop_requested(token: &CancellationToken, external: Option<&CancellationToken>) -> bool {
    token.is_cancelled() || external.is_some_and(CancellationToken::is_cancelled)
}
