//! One download run: catalog fetch, filter, task derivation, bounded download pool.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::catalog::{Catalog, CatalogError, CatalogSource, HttpCatalog, SessionRecord};
use crate::config::ConfdlConfig;
use crate::control::CancelToken;
use crate::downloader::{AssetFetcher, CurlFetcher};
use crate::filter::{filter_sessions, FilterCriterion, FilterError};
use crate::retry::RetryPolicy;
use crate::scheduler::{run_units_parallel, PoolOptions, RunSummary, TaskReport};
use crate::storage::{prepare_destination, DestinationError};
use crate::tasks::{derive_units, AssetRestriction, PlaceholderIds};

/// What to download and where.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub criterion: FilterCriterion,
    pub destination: PathBuf,
    pub restriction: AssetRestriction,
}

/// Result of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Sessions selected by the filter, duplicates included.
    pub matched_sessions: usize,
    pub summary: RunSummary,
}

/// Errors that stop a run before any download starts.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Destination(#[from] DestinationError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("catalog worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Drives runs against a catalog source and an asset fetcher.
pub struct Runner {
    catalog: Arc<dyn CatalogSource>,
    fetcher: Arc<dyn AssetFetcher>,
    pool: PoolOptions,
    seed: Option<u64>,
    progress: Option<mpsc::Sender<TaskReport>>,
    cancel: Option<CancelToken>,
}

impl Runner {
    pub fn new(catalog: Arc<dyn CatalogSource>, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self {
            catalog,
            fetcher,
            pool: PoolOptions::default(),
            seed: None,
            progress: None,
            cancel: None,
        }
    }

    /// HTTP catalog and curl fetcher configured from `cfg`.
    pub fn from_config(cfg: &ConfdlConfig) -> Self {
        let curl = cfg.curl_options();
        let retry = cfg.retry_policy();
        let catalog = HttpCatalog::new(cfg.catalog_url.clone(), curl, retry);
        Self::new(Arc::new(catalog), Arc::new(CurlFetcher::new(curl)))
            .workers(cfg.worker_count())
            .retry(retry)
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.pool.workers = workers.max(1);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.pool.retry = retry;
        self
    }

    /// Seed for placeholder identifiers of sessions without a code.
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Stream every task report to `tx` as it completes.
    pub fn progress(mut self, tx: mpsc::Sender<TaskReport>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    async fn fetch_catalog(&self) -> Result<Catalog, RunError> {
        let source = Arc::clone(&self.catalog);
        let catalog = tokio::task::spawn_blocking(move || source.fetch()).await??;
        Ok(catalog)
    }

    /// Fetch the catalog and return the sessions `criterion` selects, without downloading.
    pub async fn matched_sessions(
        &self,
        criterion: &FilterCriterion,
    ) -> Result<Vec<SessionRecord>, RunError> {
        let catalog = self.fetch_catalog().await?;
        let matched = filter_sessions(&catalog, criterion)?;
        Ok(matched.into_iter().cloned().collect())
    }

    /// Execute one run. Task failures end up in the summary; only setup errors are returned.
    pub async fn run(self, request: RunRequest) -> Result<RunReport, RunError> {
        prepare_destination(&request.destination)?;
        let catalog = self.fetch_catalog().await?;
        let matched = filter_sessions(&catalog, &request.criterion)?;
        tracing::info!(
            filter = %request.criterion,
            matched = matched.len(),
            catalog = catalog.len(),
            "sessions selected"
        );
        if matched.is_empty() {
            tracing::warn!(filter = %request.criterion, "no sessions matched");
            return Ok(RunReport::default());
        }

        let mut ids = PlaceholderIds::new(self.seed);
        let units = derive_units(
            &matched,
            request.restriction,
            &request.destination,
            &mut ids,
        );
        let matched_sessions = matched.len();

        let summary =
            run_units_parallel(units, self.fetcher, self.pool, self.progress, self.cancel).await;
        Ok(RunReport {
            matched_sessions,
            summary,
        })
    }
}
