//! Run session-units on a bounded pool of blocking workers.
//!
//! Keeps up to `workers` units in flight; when one finishes, the next queued
//! unit starts, until the queue is empty or the run is cancelled.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::outcome::{RunSummary, TaskReport};
use super::unit::run_unit_guarded;
use crate::control::CancelToken;
use crate::downloader::AssetFetcher;
use crate::retry::RetryPolicy;
use crate::tasks::SessionUnit;

/// Pool size and per-task retry budget.
#[derive(Debug, Clone, Copy)]
pub struct PoolOptions {
    /// Maximum session-units running at once (clamped to at least 1).
    pub workers: usize,
    pub retry: RetryPolicy,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            retry: RetryPolicy::default(),
        }
    }
}

/// Runs `units` with at most `opts.workers` in flight and returns the summary.
///
/// Each unit runs on a blocking thread; its tasks run in order there. Task
/// failures are recorded, never propagated. Every report is also sent to
/// `progress_tx` when given. With `cancel` set, no further unit is dispatched
/// and the tasks left in the queue are counted as not started.
pub async fn run_units_parallel(
    units: Vec<SessionUnit>,
    fetcher: Arc<dyn AssetFetcher>,
    opts: PoolOptions,
    progress_tx: Option<mpsc::Sender<TaskReport>>,
    cancel: Option<CancelToken>,
) -> RunSummary {
    let workers = opts.workers.max(1);
    let mut queue: VecDeque<SessionUnit> = units.into();
    let mut join_set = JoinSet::new();
    let mut summary = RunSummary::default();
    let is_cancelled = || cancel.as_ref().is_some_and(CancelToken::is_cancelled);

    tracing::info!(units = queue.len(), workers, "starting downloads");

    loop {
        while join_set.len() < workers && !is_cancelled() {
            let Some(unit) = queue.pop_front() else {
                break;
            };
            let fetcher = Arc::clone(&fetcher);
            let policy = opts.retry;
            join_set.spawn_blocking(move || run_unit_guarded(&unit, &*fetcher, &policy));
        }

        if join_set.is_empty() {
            break;
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        match res {
            Ok(reports) => {
                for report in reports {
                    summary.record(&report);
                    if let Some(tx) = &progress_tx {
                        let _ = tx.send(report).await;
                    }
                }
            }
            Err(e) => tracing::error!("session worker join: {}", e),
        }
    }

    if !queue.is_empty() {
        summary.not_started = queue.iter().map(|u| u.tasks.len()).sum();
        tracing::warn!(
            units = queue.len(),
            tasks = summary.not_started,
            "run cancelled before all sessions were dispatched"
        );
    }
    tracing::info!("downloads finished: {}", summary);
    summary
}
