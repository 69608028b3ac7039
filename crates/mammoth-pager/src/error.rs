use std::time::Duration;

pub type Result<T> = std::result::Result<T, PagerError>;

/// Errors surfaced by page providers.
#[derive(Debug, thiserror::Error)]
pub enum PagerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The raw bytes of a page did not decode as UTF-8, or a page boundary
    /// fell where no character boundary could be reconstructed.
    #[error("page {page_number} is not valid UTF-8")]
    InvalidUtf8 { page_number: u64 },

    #[error("page {page_number} is out of range (page count {page_count})")]
    PageOutOfRange { page_number: u64, page_count: u64 },

    /// A bounded fetch ran out of time. The underlying read keeps running on
    /// its worker; only the wait is abandoned.
    #[error("fetch of page {page_number} timed out after {waited:?}")]
    Timeout { page_number: u64, waited: Duration },

    /// The fetch worker is gone, typically because it panicked or its
    /// fetcher was dropped.
    #[error("page fetch worker disconnected")]
    Disconnected,
}
