//! Transfer error type shared by the catalog fetch and asset downloads.

/// Error returned by a single HTTP transfer attempt. Kept separate from `anyhow`
/// so the retry loop can classify it before it is turned into a task outcome.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The URL is malformed or not http(s). Not retried.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Curl reported an error (timeout, connection, etc.).
    #[error(transparent)]
    Curl(#[from] curl::Error),
    /// Final HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Local write failed (disk full, permission denied). Not retried.
    #[error("storage: {0}")]
    Storage(#[source] std::io::Error),
}

impl TransferError {
    pub(crate) fn invalid_url(url: &str, reason: impl ToString) -> Self {
        TransferError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
