use crossbeam_channel::{Receiver, Sender};

use crate::{
    CloseSearchCallback, RangeSearchCallback, SearchError, SearchResult, SearchTaskId,
};

/// A search callback flattened into plain data, for consumers that prefer a
/// channel over implementing a callback trait.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    Progress {
        task: SearchTaskId,
        page_number: u64,
        pages_total: u64,
    },
    /// Terminal event of a close search that found a match.
    ClosestFound {
        task: SearchTaskId,
        frame_matches: Vec<SearchResult>,
        closest: usize,
    },
    /// One frame's worth of range-search matches.
    FrameResults {
        task: SearchTaskId,
        page_number: u64,
        matches: Vec<SearchResult>,
    },
    Finished {
        task: SearchTaskId,
        last_scanned_page: Option<u64>,
    },
    Stopped {
        task: SearchTaskId,
        page_number: u64,
    },
    /// Errors cross the channel as rendered text; the error value itself
    /// stays with the task that logged it.
    Failed {
        task: SearchTaskId,
        error: String,
    },
}

impl SearchEvent {
    /// Whether this event ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SearchEvent::ClosestFound { .. }
                | SearchEvent::Finished { .. }
                | SearchEvent::Stopped { .. }
                | SearchEvent::Failed { .. }
        )
    }

    pub fn task(&self) -> SearchTaskId {
        match self {
            SearchEvent::Progress { task, .. }
            | SearchEvent::ClosestFound { task, .. }
            | SearchEvent::FrameResults { task, .. }
            | SearchEvent::Finished { task, .. }
            | SearchEvent::Stopped { task, .. }
            | SearchEvent::Failed { task, .. } => *task,
        }
    }
}

/// Forwards callbacks into a channel.
///
/// Send failures are ignored: a disconnected receiver just means nobody is
/// listening anymore, which must not disturb the task.
#[derive(Debug, Clone)]
pub struct EventSender {
    events: Sender<SearchEvent>,
}

impl EventSender {
    pub fn new(events: Sender<SearchEvent>) -> Self {
        Self { events }
    }

    /// Convenience pair of a sender and its unbounded receiver.
    pub fn channel() -> (Self, Receiver<SearchEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::new(tx), rx)
    }

    fn send(&self, event: SearchEvent) {
        let _ = self.events.send(event);
    }
}

impl CloseSearchCallback for EventSender {
    fn search_progress(&self, task: SearchTaskId, page_number: u64, pages_total: u64) {
        self.send(SearchEvent::Progress {
            task,
            page_number,
            pages_total,
        });
    }

    fn closest_result_found(&self, task: SearchTaskId, frame_matches: &[SearchResult], closest: usize) {
        self.send(SearchEvent::ClosestFound {
            task,
            frame_matches: frame_matches.to_vec(),
            closest,
        });
    }

    fn search_finished(&self, task: SearchTaskId, last_scanned_page: Option<u64>) {
        self.send(SearchEvent::Finished {
            task,
            last_scanned_page,
        });
    }

    fn search_stopped(&self, task: SearchTaskId, page_number: u64) {
        self.send(SearchEvent::Stopped { task, page_number });
    }

    fn search_failed(&self, task: SearchTaskId, error: &SearchError) {
        self.send(SearchEvent::Failed {
            task,
            error: error.to_string(),
        });
    }
}

impl RangeSearchCallback for EventSender {
    fn search_progress(&self, task: SearchTaskId, page_number: u64, pages_total: u64) {
        self.send(SearchEvent::Progress {
            task,
            page_number,
            pages_total,
        });
    }

    fn frame_results_found(&self, task: SearchTaskId, page_number: u64, matches: Vec<SearchResult>) {
        self.send(SearchEvent::FrameResults {
            task,
            page_number,
            matches,
        });
    }

    fn search_finished(&self, task: SearchTaskId, last_scanned_page: Option<u64>) {
        self.send(SearchEvent::Finished {
            task,
            last_scanned_page,
        });
    }

    fn search_stopped(&self, task: SearchTaskId, page_number: u64) {
        self.send(SearchEvent::Stopped { task, page_number });
    }

    fn search_failed(&self, task: SearchTaskId, error: &SearchError) {
        self.send(SearchEvent::Failed {
            task,
            error: error.to_string(),
        });
    }
}
