//! Retry and backoff policy.
//!
//! Classifies transfer failures (timeouts, throttling, connection drops) and
//! decides exponential backoff, so the catalog fetch and every asset download
//! share one consistent budget.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::TransferError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
