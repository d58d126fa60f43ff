//! Runs the tasks of one session-unit, in order, on the calling thread.

use std::panic::{self, AssertUnwindSafe};

use super::outcome::{TaskOutcome, TaskReport};
use crate::downloader::{AssetFetcher, FetchMode};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::tasks::{DownloadTask, SessionUnit};

/// Fetch one task with retries. An empty URL is skipped without touching the network.
/// The destination is re-checked before every attempt, so a retry after a
/// partial write resumes instead of starting over.
pub(crate) fn run_task(
    task: &DownloadTask,
    fetcher: &dyn AssetFetcher,
    policy: &RetryPolicy,
) -> TaskReport {
    if task.source_url.trim().is_empty() {
        tracing::debug!(session = %task.session_id, asset = %task.asset_type, "no link, skipping");
        return TaskReport::new(task, TaskOutcome::Skipped);
    }

    let result = run_with_retry(policy, || {
        let mode = FetchMode::for_destination(&task.destination);
        tracing::debug!(
            session = %task.session_id,
            asset = %task.asset_type,
            ?mode,
            path = %task.destination.display(),
            "fetching"
        );
        fetcher.fetch(&task.source_url, &task.destination, mode)
    });

    let outcome = match result {
        Ok(stats) => {
            tracing::info!(
                session = %task.session_id,
                asset = %task.asset_type,
                bytes = stats.bytes_written,
                kind = ?stats.kind,
                "downloaded {}",
                task.destination.display()
            );
            TaskOutcome::Success(stats)
        }
        Err(e) => {
            tracing::warn!(
                session = %task.session_id,
                asset = %task.asset_type,
                url = %task.source_url,
                "download failed: {}",
                e
            );
            TaskOutcome::Failed(e.to_string())
        }
    };
    TaskReport::new(task, outcome)
}

/// Run every task of `unit` sequentially (video before slides).
pub(crate) fn run_unit(
    unit: &SessionUnit,
    fetcher: &dyn AssetFetcher,
    policy: &RetryPolicy,
) -> Vec<TaskReport> {
    unit.tasks
        .iter()
        .map(|task| run_task(task, fetcher, policy))
        .collect()
}

/// Like [`run_unit`], but a panicking fetcher fails the unit's tasks instead of the pool.
pub(crate) fn run_unit_guarded(
    unit: &SessionUnit,
    fetcher: &dyn AssetFetcher,
    policy: &RetryPolicy,
) -> Vec<TaskReport> {
    match panic::catch_unwind(AssertUnwindSafe(|| run_unit(unit, fetcher, policy))) {
        Ok(reports) => reports,
        Err(_) => {
            tracing::error!(session = %unit.session_id, "session worker panicked");
            unit.tasks
                .iter()
                .map(|t| TaskReport::new(t, TaskOutcome::Failed("worker panicked".to_string())))
                .collect()
        }
    }
}
