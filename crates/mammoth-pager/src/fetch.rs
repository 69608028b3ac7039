use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{Page, PageProvider, PagerError, Result};

/// Hands page reads to a dedicated worker thread and returns promises.
///
/// The worker serves requests in submission order. A waiter that gives up
/// (times out or is dropped) does not interrupt the read: the worker finishes
/// it and discards the result. Dropping the fetcher closes the request
/// channel and the worker exits after the read in flight, so no thread is
/// ever killed.
pub struct PageFetcher {
    requests: mpsc::Sender<FetchRequest>,
}

struct FetchRequest {
    page_number: u64,
    reply: mpsc::Sender<Result<Page>>,
}

impl PageFetcher {
    pub fn new<P>(provider: Arc<P>) -> std::io::Result<Self>
    where
        P: PageProvider + ?Sized + 'static,
    {
        let (requests, queue) = mpsc::channel::<FetchRequest>();
        std::thread::Builder::new()
            .name("mammoth-page-fetch".to_owned())
            .spawn(move || {
                while let Ok(request) = queue.recv() {
                    let result = provider.read_page(request.page_number);
                    if request.reply.send(result).is_err() {
                        tracing::trace!(
                            target: "mammoth.pager",
                            page_number = request.page_number,
                            "fetch waiter gone; discarding page"
                        );
                    }
                }
            })?;
        Ok(Self { requests })
    }

    /// Queues a fetch and returns a promise for its completion.
    pub fn fetch(&self, page_number: u64) -> PendingPage {
        let (reply, receipt) = mpsc::channel();
        if self.requests.send(FetchRequest { page_number, reply }).is_err() {
            // Worker already gone; the dropped reply sender surfaces as
            // `Disconnected` when the promise is awaited.
            tracing::trace!(
                target: "mammoth.pager",
                page_number,
                "fetch worker gone; request dropped"
            );
        }
        PendingPage {
            page_number,
            receipt,
        }
    }
}

/// Promise for a page fetch running on a [`PageFetcher`] worker.
#[must_use = "a pending page does nothing until awaited"]
pub struct PendingPage {
    page_number: u64,
    receipt: mpsc::Receiver<Result<Page>>,
}

impl PendingPage {
    pub fn page_number(&self) -> u64 {
        self.page_number
    }

    /// Blocks until the fetch completes.
    pub fn wait(self) -> Result<Page> {
        match self.receipt.recv() {
            Ok(result) => result,
            Err(_) => Err(PagerError::Disconnected),
        }
    }

    /// Blocks until the fetch completes or `timeout` elapses, whichever comes
    /// first. On timeout the read itself keeps running on the worker; only
    /// this wait is abandoned.
    pub fn wait_up_to(self, timeout: Duration) -> Result<Page> {
        let started = Instant::now();
        match self.receipt.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(PagerError::Timeout {
                page_number: self.page_number,
                waited: started.elapsed(),
            }),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(PagerError::Disconnected),
        }
    }
}

/// [`PageProvider`] adapter that bounds every read with a timeout.
///
/// Reads run on a [`PageFetcher`] worker; callers never wait longer than the
/// configured timeout for a single page. A stalled read delays later fetches
/// on the same worker rather than piling up threads.
pub struct TimedPager {
    provider: Arc<dyn PageProvider>,
    fetcher: PageFetcher,
    timeout: Duration,
}

impl TimedPager {
    pub fn new(provider: Arc<dyn PageProvider>, timeout: Duration) -> std::io::Result<Self> {
        let fetcher = PageFetcher::new(Arc::clone(&provider))?;
        Ok(Self {
            provider,
            fetcher,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl PageProvider for TimedPager {
    fn page_count(&self) -> Result<u64> {
        // Counting pages is metadata-cheap for every known provider; only the
        // reads go through the worker.
        self.provider.page_count()
    }

    fn read_page(&self, page_number: u64) -> Result<Page> {
        self.fetcher.fetch(page_number).wait_up_to(self.timeout)
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}
