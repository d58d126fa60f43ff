//! Asset downloader.
//!
//! One HTTP GET per asset, streamed straight into the destination file. When
//! the file already exists the GET carries a byte range starting at its
//! current length, so interrupted downloads continue instead of restarting.

mod transfer;

use std::path::Path;
use std::time::Duration;

use crate::retry::TransferError;

pub use transfer::{download_to_file, get_bytes};

/// Curl tuning shared by the catalog fetch and asset downloads.
#[derive(Debug, Clone, Copy)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Abort if throughput stays below `low_speed_limit` bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    /// Optional per-transfer bandwidth cap in bytes per second.
    pub max_recv_speed: Option<u64>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            max_recv_speed: None,
        }
    }
}

/// How a single attempt treats the destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Create or overwrite the destination.
    Fresh,
    /// Continue an existing destination from its current length.
    Resume,
}

impl FetchMode {
    /// Resume when the destination already exists, otherwise start fresh.
    pub fn for_destination(path: &Path) -> Self {
        if path.exists() {
            FetchMode::Resume
        } else {
            FetchMode::Fresh
        }
    }
}

/// What a successful transfer did to the destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Whole body written to a new or truncated file.
    Fresh,
    /// Server honored the range; bytes appended after `from`.
    Resumed { from: u64 },
    /// Resume requested but the server sent the full body; file rewritten.
    Restarted,
    /// Server answered 416 to the resume range: the file was already complete.
    AlreadyComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferStats {
    pub kind: TransferKind,
    /// Body bytes written during this transfer.
    pub bytes_written: u64,
}

/// Fetches one asset URL into a destination path. The executor drives retries;
/// implementations perform exactly one attempt per call.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, url: &str, dest: &Path, mode: FetchMode)
        -> Result<TransferStats, TransferError>;
}

/// libcurl-backed fetcher used outside tests.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    curl: CurlOptions,
}

impl CurlFetcher {
    pub fn new(curl: CurlOptions) -> Self {
        Self { curl }
    }
}

impl AssetFetcher for CurlFetcher {
    fn fetch(
        &self,
        url: &str,
        dest: &Path,
        mode: FetchMode,
    ) -> Result<TransferStats, TransferError> {
        download_to_file(url, dest, mode, &self.curl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_follows_destination_existence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BRK100.mp4");
        assert_eq!(FetchMode::for_destination(&path), FetchMode::Fresh);
        std::fs::write(&path, b"partial").unwrap();
        assert_eq!(FetchMode::for_destination(&path), FetchMode::Resume);
    }

    #[test]
    fn non_http_url_is_rejected_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BRK100.mp4");
        let err = CurlFetcher::default()
            .fetch("ftp://example.com/video.mp4", &path, FetchMode::Fresh)
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidUrl { .. }));
        assert!(!path.exists());
    }
}
