//! `confdl list` – show which sessions a filter selects.

use anyhow::Result;
use confdl_core::catalog::SessionRecord;
use confdl_core::config::ConfdlConfig;
use confdl_core::filter::FilterCriterion;
use confdl_core::runner::Runner;

pub async fn run_list(cfg: &ConfdlConfig, criterion: FilterCriterion) -> Result<()> {
    let runner = Runner::from_config(cfg);
    let matched = runner.matched_sessions(&criterion).await?;
    if matched.is_empty() {
        println!("No sessions match {}.", criterion);
        return Ok(());
    }
    println!("{:<10} {:>5}  {:<5} {:<6} TITLE", "CODE", "LEVEL", "VIDEO", "SLIDES");
    for session in &matched {
        println!("{}", format_row(session));
    }
    println!("{} session(s) match {}", matched.len(), criterion);
    Ok(())
}

fn format_row(session: &SessionRecord) -> String {
    let code = if session.session_code.trim().is_empty() {
        "-"
    } else {
        session.session_code.as_str()
    };
    let level = session
        .level
        .map(|l| l.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mark = |link: &Option<String>| if link.is_some() { "yes" } else { "no" };
    format!(
        "{:<10} {:>5}  {:<5} {:<6} {}",
        code,
        level,
        mark(&session.download_video_link),
        mark(&session.slide_deck),
        session.title
    )
}
