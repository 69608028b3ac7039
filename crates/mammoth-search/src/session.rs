use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use mammoth_core::CancellationToken;
use mammoth_pager::PageProvider;

use crate::{
    CloseSearchCallback, CloseSearchTask, RangeSearchCallback, RangeSearchTask, Result,
    SearchError, SearchResult, SearchTaskId, SearchTaskOptions,
};

/// Owns the background thread running at most one search task per document.
///
/// Starting a new search stops the previous one first, so a stale run can
/// only fire events bearing its own id before winding down. Validation of
/// the options happens here, on the caller's thread, before anything is
/// spawned; pattern compilation failures surface here too. Callbacks run on
/// the task thread.
///
/// Dropping the session cancels the active task without waiting for it; use
/// [`SearchSession::wait_idle`] to block until the thread has wound down.
pub struct SearchSession<P> {
    provider: Arc<P>,
    active: parking_lot::Mutex<Option<ActiveSearch>>,
}

struct ActiveSearch {
    id: SearchTaskId,
    token: CancellationToken,
    thread: JoinHandle<()>,
}

impl<P: PageProvider + 'static> SearchSession<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            active: parking_lot::Mutex::new(None),
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Starts a close search, stopping any active task first.
    pub fn start_close_search<C>(
        &self,
        options: SearchTaskOptions,
        callback: C,
    ) -> Result<SearchTaskId>
    where
        C: CloseSearchCallback + 'static,
    {
        options.validate()?;
        let task = CloseSearchTask::new(options, Arc::clone(&self.provider), callback)?;
        let id = task.id();
        let token = task.token();
        self.replace_active(id, token, move || task.run())?;
        Ok(id)
    }

    /// Starts a range search, stopping any active task first.
    ///
    /// The session enforces the options' result cap: the batch that crosses
    /// the cap is truncated to fit, the remaining pages are not searched and
    /// the run ends with `search_stopped`.
    pub fn start_range_search<C>(
        &self,
        options: SearchTaskOptions,
        callback: C,
    ) -> Result<SearchTaskId>
    where
        C: RangeSearchCallback + 'static,
    {
        options.validate()?;
        let token = CancellationToken::new();
        let callback = CapEnforcer {
            inner: callback,
            token: token.clone(),
            cap: options.result_cap,
            streamed: AtomicUsize::new(0),
        };
        let task = RangeSearchTask::new(options, Arc::clone(&self.provider), callback)?
            .with_token(token.clone());
        let id = task.id();
        self.replace_active(id, token, move || task.run())?;
        Ok(id)
    }

    /// Requests the active task, if any, to stop. Returns immediately; the
    /// task fires `search_stopped` once it observes the request.
    pub fn stop(&self) {
        if let Some(active) = self.active.lock().as_ref() {
            tracing::debug!(
                target: "mammoth.search.session",
                task = %active.id,
                "stop requested"
            );
            active.token.cancel();
        }
    }

    pub fn active_task(&self) -> Option<SearchTaskId> {
        self.active.lock().as_ref().map(|active| active.id)
    }

    pub fn is_searching(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|active| !active.thread.is_finished())
    }

    /// Blocks until the active task's thread has wound down. Intended for
    /// shutdown paths and tests.
    pub fn wait_idle(&self) {
        let active = self.active.lock().take();
        if let Some(active) = active {
            if active.thread.join().is_err() {
                tracing::error!(
                    target: "mammoth.search.session",
                    task = %active.id,
                    "search task thread panicked"
                );
            }
        }
    }

    fn replace_active(
        &self,
        id: SearchTaskId,
        token: CancellationToken,
        run: impl FnOnce() + Send + 'static,
    ) -> Result<()> {
        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            tracing::debug!(
                target: "mammoth.search.session",
                previous = %previous.id,
                next = %id,
                "stopping previous search"
            );
            previous.token.cancel();
        }
        let thread = std::thread::Builder::new()
            .name(format!("mammoth-search-{id}"))
            .spawn(move || {
                if std::panic::catch_unwind(AssertUnwindSafe(run)).is_err() {
                    tracing::error!(
                        target: "mammoth.search.session",
                        task = %id,
                        "search task panicked"
                    );
                }
            })
            .map_err(SearchError::TaskSpawn)?;
        *active = Some(ActiveSearch { id, token, thread });
        Ok(())
    }
}

impl<P> Drop for SearchSession<P> {
    fn drop(&mut self) {
        if let Some(active) = self.active.lock().take() {
            active.token.cancel();
        }
    }
}

/// Range callback decorator that truncates the batch crossing the result cap
/// and stops the task once the cap is reached.
struct CapEnforcer<C> {
    inner: C,
    token: CancellationToken,
    cap: Option<usize>,
    streamed: AtomicUsize,
}

impl<C: RangeSearchCallback> RangeSearchCallback for CapEnforcer<C> {
    fn search_progress(&self, task: SearchTaskId, page_number: u64, pages_total: u64) {
        self.inner.search_progress(task, page_number, pages_total);
    }

    fn frame_results_found(
        &self,
        task: SearchTaskId,
        page_number: u64,
        mut matches: Vec<SearchResult>,
    ) {
        let Some(cap) = self.cap else {
            self.inner.frame_results_found(task, page_number, matches);
            return;
        };
        // Callbacks run on the single task thread, so plain load/store is
        // enough here.
        let streamed = self.streamed.load(Ordering::Relaxed);
        let remaining = cap.saturating_sub(streamed);
        if remaining == 0 {
            self.token.cancel();
            return;
        }
        if matches.len() >= remaining {
            matches.truncate(remaining);
            self.streamed.store(cap, Ordering::Relaxed);
            self.inner.frame_results_found(task, page_number, matches);
            tracing::debug!(
                target: "mammoth.search.session",
                task = %task,
                cap,
                "result cap reached; stopping range search"
            );
            self.token.cancel();
        } else {
            self.streamed.store(streamed + matches.len(), Ordering::Relaxed);
            self.inner.frame_results_found(task, page_number, matches);
        }
    }

    fn search_finished(&self, task: SearchTaskId, last_scanned_page: Option<u64>) {
        self.inner.search_finished(task, last_scanned_page);
    }

    fn search_stopped(&self, task: SearchTaskId, page_number: u64) {
        self.inner.search_stopped(task, page_number);
    }

    fn search_failed(&self, task: SearchTaskId, error: &SearchError) {
        self.inner.search_failed(task, error);
    }
}
