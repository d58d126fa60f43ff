//! `confdl download` – fetch assets of the sessions a filter selects.

use std::path::PathBuf;

use anyhow::Result;
use confdl_core::config::ConfdlConfig;
use confdl_core::control::CancelToken;
use confdl_core::downloader::TransferKind;
use confdl_core::filter::FilterCriterion;
use confdl_core::runner::{RunRequest, Runner};
use confdl_core::scheduler::{TaskOutcome, TaskReport};
use confdl_core::tasks::AssetRestriction;

#[derive(Debug, Clone)]
pub struct DownloadArgs {
    pub criterion: FilterCriterion,
    pub restriction: AssetRestriction,
    pub directory: PathBuf,
    pub workers: Option<usize>,
    pub seed: Option<u64>,
}

pub async fn run_download(cfg: &ConfdlConfig, args: DownloadArgs) -> Result<()> {
    let workers = args.workers.unwrap_or_else(|| cfg.worker_count());
    println!(
        "Downloading sessions with {} into {} ({} workers)",
        args.criterion,
        args.directory.display(),
        workers
    );

    let cancel = CancelToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Interrupted: finishing sessions in progress, not starting new ones.");
                cancel.cancel();
            }
        })
    };

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<TaskReport>(32);
    let printer = tokio::spawn(async move {
        while let Some(report) = progress_rx.recv().await {
            println!("{}", format_report(&report));
        }
    });

    let runner = Runner::from_config(cfg)
        .workers(workers)
        .seed(args.seed)
        .progress(progress_tx)
        .cancel_token(cancel.clone());
    let result = runner
        .run(RunRequest {
            criterion: args.criterion,
            destination: args.directory,
            restriction: args.restriction,
        })
        .await;

    let _ = printer.await;
    interrupt.abort();
    let report = result?;

    if report.matched_sessions == 0 {
        println!("No sessions matched the filter.");
        return Ok(());
    }
    let summary = report.summary;
    println!(
        "{} session(s) matched: {}",
        report.matched_sessions, summary
    );
    for failure in &summary.failures {
        println!(
            "  failed: {} {} ({})",
            failure.session_id, failure.asset_type, failure.reason
        );
    }

    if summary.cancelled() {
        anyhow::bail!(
            "interrupted with {} task(s) not started",
            summary.not_started
        );
    }
    if summary.failed > 0 {
        anyhow::bail!("{} download(s) failed", summary.failed);
    }
    Ok(())
}

fn format_report(report: &TaskReport) -> String {
    let name = report.file_name();
    match &report.outcome {
        TaskOutcome::Success(stats) => {
            let mib = stats.bytes_written as f64 / 1_048_576.0;
            let note = match stats.kind {
                TransferKind::Fresh => String::new(),
                TransferKind::Resumed { from } => format!(", resumed at {} bytes", from),
                TransferKind::Restarted => ", restarted".to_string(),
                TransferKind::AlreadyComplete => ", already complete".to_string(),
            };
            format!("  ok       {} ({:.1} MiB{})", name, mib, note)
        }
        TaskOutcome::Skipped => format!("  skipped  {} (no {} link)", name, report.asset_type),
        TaskOutcome::Failed(reason) => format!("  FAILED   {}: {}", name, reason),
    }
}
