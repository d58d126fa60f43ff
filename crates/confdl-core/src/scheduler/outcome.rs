//! Per-task outcomes and the run summary built from them.

use std::fmt;
use std::path::PathBuf;

use crate::downloader::TransferStats;
use crate::tasks::{AssetType, DownloadTask};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success(TransferStats),
    /// Gave up after the retry budget (or a non-retryable error); holds the reason.
    Failed(String),
    /// No source URL for this asset; nothing was fetched.
    Skipped,
}

/// Outcome of one task, with enough context to report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub session_id: String,
    pub asset_type: AssetType,
    pub destination: PathBuf,
    pub outcome: TaskOutcome,
}

impl TaskReport {
    pub fn new(task: &DownloadTask, outcome: TaskOutcome) -> Self {
        Self {
            session_id: task.session_id.clone(),
            asset_type: task.asset_type,
            destination: task.destination.clone(),
            outcome,
        }
    }

    /// Destination file name for display.
    pub fn file_name(&self) -> String {
        self.destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.destination.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub session_id: String,
    pub asset_type: AssetType,
    pub reason: String,
}

/// Counts per outcome category plus the reason of every failure.
/// Order-independent: reports can be recorded in any completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Tasks never dispatched because the run was cancelled.
    pub not_started: usize,
    pub failures: Vec<TaskFailure>,
}

impl RunSummary {
    pub fn record(&mut self, report: &TaskReport) {
        match &report.outcome {
            TaskOutcome::Success(_) => self.succeeded += 1,
            TaskOutcome::Skipped => self.skipped += 1,
            TaskOutcome::Failed(reason) => {
                self.failed += 1;
                self.failures.push(TaskFailure {
                    session_id: report.session_id.clone(),
                    asset_type: report.asset_type,
                    reason: reason.clone(),
                });
            }
        }
    }

    /// Tasks that reached an outcome.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    pub fn cancelled(&self) -> bool {
        self.not_started > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} skipped, {} failed",
            self.succeeded, self.skipped, self.failed
        )?;
        if self.not_started > 0 {
            write!(f, ", {} not started", self.not_started)?;
        }
        Ok(())
    }
}
