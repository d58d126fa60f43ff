//! CLI for confdl.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use confdl_core::config;
use confdl_core::filter::FilterCriterion;
use confdl_core::tasks::AssetRestriction;

use commands::{run_completions, run_download, run_list, run_man, DownloadArgs};

/// Top-level CLI for confdl.
#[derive(Debug, Parser)]
#[command(name = "confdl", version)]
#[command(
    about = "confdl: bulk download of conference session videos and slide decks",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download the videos and slide decks of the sessions a filter selects.
    Download {
        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        assets: AssetArgs,

        /// Destination directory (default: `download_dir` from config, else the current directory).
        #[arg(long, short = 'd', value_name = "DIR")]
        directory: Option<PathBuf>,

        /// Sessions downloaded in parallel (default: `max_workers` from config, else CPU count).
        #[arg(long, short = 'j', value_name = "N")]
        workers: Option<usize>,

        /// Override the session catalog endpoint.
        #[arg(long, value_name = "URL")]
        catalog_url: Option<String>,

        /// Seed for the placeholder names of sessions without a code.
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,
    },

    /// List the sessions a filter selects, without downloading anything.
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Override the session catalog endpoint.
        #[arg(long, value_name = "URL")]
        catalog_url: Option<String>,
    },

    /// Print a shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

/// Exactly one filter per run. Repeat a flag for several values; `--code` and
/// `--level` also accept comma-separated lists. Pattern flags never split on commas.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct FilterArgs {
    /// Session codes; `*` and `?` wildcards, case-insensitive (e.g. `THR*`).
    #[arg(long, value_name = "CODE", value_delimiter = ',', num_args = 1..)]
    pub code: Vec<String>,

    /// Regular expression matched against session titles, case-insensitive.
    #[arg(long, value_name = "REGEX")]
    pub title: Option<String>,

    /// Topic patterns (regex, case-insensitive).
    #[arg(long, value_name = "TOPIC")]
    pub topic: Vec<String>,

    /// Session levels: 100, 200, 300 or 400.
    #[arg(
        long,
        value_name = "LEVEL",
        value_delimiter = ',',
        num_args = 1..,
        value_parser = parse_level
    )]
    pub level: Vec<u32>,

    /// Product patterns (regex, case-insensitive).
    #[arg(long, value_name = "PRODUCT")]
    pub product: Vec<String>,

    /// Speaker name patterns (regex, case-insensitive).
    #[arg(long, value_name = "NAME")]
    pub speaker_name: Vec<String>,

    /// Speaker company patterns (regex, case-insensitive).
    #[arg(long, value_name = "COMPANY")]
    pub speaker_company: Vec<String>,
}

impl FilterArgs {
    pub fn criterion(self) -> Result<FilterCriterion> {
        let criterion = if !self.code.is_empty() {
            FilterCriterion::ByCode(self.code)
        } else if let Some(title) = self.title {
            FilterCriterion::ByTitle(title)
        } else if !self.topic.is_empty() {
            FilterCriterion::ByTopic(self.topic)
        } else if !self.level.is_empty() {
            FilterCriterion::ByLevel(self.level)
        } else if !self.product.is_empty() {
            FilterCriterion::ByProduct(self.product)
        } else if !self.speaker_name.is_empty() {
            FilterCriterion::BySpeakerName(self.speaker_name)
        } else if !self.speaker_company.is_empty() {
            FilterCriterion::BySpeakerCompany(self.speaker_company)
        } else {
            anyhow::bail!("a session filter is required");
        };
        Ok(criterion)
    }
}

#[derive(Debug, Clone, Copy, Args)]
#[group(multiple = false)]
pub struct AssetArgs {
    /// Download session videos only.
    #[arg(long)]
    pub video_only: bool,

    /// Download slide decks only.
    #[arg(long)]
    pub slides_only: bool,
}

impl AssetArgs {
    pub fn restriction(self) -> AssetRestriction {
        match (self.video_only, self.slides_only) {
            (true, _) => AssetRestriction::VideoOnly,
            (_, true) => AssetRestriction::SlidesOnly,
            _ => AssetRestriction::Both,
        }
    }
}

fn parse_level(s: &str) -> Result<u32, String> {
    let level: u32 = s
        .trim()
        .parse()
        .map_err(|_| format!("{s:?} is not a number"))?;
    match level {
        100 | 200 | 300 | 400 => Ok(level),
        _ => Err(format!("{level} is not a session level (100, 200, 300, 400)")),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man()?,
            CliCommand::Download {
                filter,
                assets,
                directory,
                workers,
                catalog_url,
                seed,
            } => {
                let mut cfg = config::load_or_init().context("load config")?;
                tracing::debug!("loaded config: {:?}", cfg);
                if let Some(url) = catalog_url {
                    cfg.catalog_url = url;
                }
                let directory = match directory.or_else(|| cfg.download_dir.clone()) {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                let args = DownloadArgs {
                    criterion: filter.criterion()?,
                    restriction: assets.restriction(),
                    directory,
                    workers,
                    seed,
                };
                run_download(&cfg, args).await?;
            }
            CliCommand::List {
                filter,
                catalog_url,
            } => {
                let mut cfg = config::load_or_init().context("load config")?;
                if let Some(url) = catalog_url {
                    cfg.catalog_url = url;
                }
                run_list(&cfg, filter.criterion()?).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
