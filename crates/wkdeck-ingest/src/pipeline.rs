//! End-to-end orchestration
//!
//! ```text
//! CheckCache ─┬─ fresh snapshot ──> SkipFetch ─┐
//!             └─ none / stale ────> Fetch ─────┴─> Transform -> Load -> Generate -> Done
//! ```
//!
//! Stages run strictly in order and the first failure aborts the run,
//! reported together with the stage it happened in. Retrying is left to
//! the stages themselves (the fetcher retries per page) or to the caller.

use crate::config::{PipelineConfig, RunOptions};
use crate::deck::{DeckBuilder, DeckError, DeckKind};
use crate::fetch::{FetchError, SubjectFetcher};
use crate::loader::{LoadError, SubjectLoader};
use crate::normalize::{normalize_records, NormalizeError, SkippedRecord};
use crate::snapshot::{self, CacheStatus};
use crate::tabular::{self, TabularError, TabularFormat};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, info_span, Instrument};
use wkdeck_common::WkError;

/// Pipeline position, used in logs and failure reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    CheckCache,
    SkipFetch,
    Fetch,
    Transform,
    Load,
    Generate,
    Done,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::CheckCache => "check_cache",
            PipelineStage::SkipFetch => "skip_fetch",
            PipelineStage::Fetch => "fetch",
            PipelineStage::Transform => "transform",
            PipelineStage::Load => "load",
            PipelineStage::Generate => "generate",
            PipelineStage::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying cause of a stage failure
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error(transparent)]
    Common(#[from] WkError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Tabular(#[from] TabularError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Deck(#[from] DeckError),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: StageFailure,
    },
}

impl PipelineError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Stage { stage, .. } => *stage,
        }
    }

    pub fn failure(&self) -> &StageFailure {
        match self {
            PipelineError::Stage { source, .. } => source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

fn failed_at<E: Into<StageFailure>>(stage: PipelineStage) -> impl FnOnce(E) -> PipelineError {
    move |e| PipelineError::Stage {
        stage,
        source: e.into(),
    }
}

/// What the transform stage produced
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub normalized_rows: usize,
    pub skipped: Vec<SkippedRecord>,
    pub csv_path: PathBuf,
    pub parquet_path: PathBuf,
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Snapshot the run transformed
    pub snapshot: PathBuf,
    /// True when the fetch was skipped in favour of a fresh snapshot
    pub used_cache: bool,
    pub normalized_rows: usize,
    pub skipped: Vec<SkippedRecord>,
    pub csv_path: PathBuf,
    pub parquet_path: PathBuf,
    pub rows_loaded: u64,
    pub decks: BTreeMap<DeckKind, PathBuf>,
}

/// Runs the stages against one configuration
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage
    ///
    /// The configuration is validated first; a validation failure is
    /// reported against [`PipelineStage::CheckCache`] before any stage runs.
    pub async fn run(&self, options: RunOptions) -> Result<PipelineReport> {
        let started = Instant::now();
        info!("Starting WaniKani ETL pipeline");

        // Nothing is fetched or written until the whole configuration checks out
        self.config
            .validate()
            .map_err(failed_at(PipelineStage::CheckCache))?;

        let (snapshot, used_cache) = match self.check_cache_stage(&options) {
            Some(path) => {
                let _span = info_span!("stage", stage = %PipelineStage::SkipFetch).entered();
                info!("Using cached data from {}", path.display());
                (path, true)
            },
            None => (self.fetch_stage().await?, false),
        };

        let transform = self.transform_stage(&snapshot).await?;
        let rows_loaded = self.load_stage(&transform.csv_path).await?;
        let decks = self.generate_stage().await?;

        let _span = info_span!("stage", stage = %PipelineStage::Done).entered();
        info!(
            used_cache,
            rows_loaded,
            decks = decks.len(),
            "Pipeline completed in {:.1}s",
            started.elapsed().as_secs_f64()
        );

        Ok(PipelineReport {
            snapshot,
            used_cache,
            normalized_rows: transform.normalized_rows,
            skipped: transform.skipped,
            csv_path: transform.csv_path,
            parquet_path: transform.parquet_path,
            rows_loaded,
            decks,
        })
    }

    /// Fresh snapshot to reuse, if the options allow it and one exists
    pub fn check_cache_stage(&self, options: &RunOptions) -> Option<PathBuf> {
        let _span = info_span!("stage", stage = %PipelineStage::CheckCache).entered();

        if !options.use_cache {
            info!("Cache disabled, fetching fresh data");
            return None;
        }
        if options.force_refresh {
            info!("Force refresh requested, fetching fresh data");
            return None;
        }

        match snapshot::check_cache(
            self.config.snapshot_dir(),
            &self.config.snapshot_base,
            options.max_cache_age_days,
        ) {
            CacheStatus::Fresh { path, .. } => Some(path),
            CacheStatus::Stale { .. } | CacheStatus::Missing => None,
        }
    }

    /// Fetch every subject and write a dated snapshot
    pub async fn fetch_stage(&self) -> Result<PathBuf> {
        let stage = PipelineStage::Fetch;
        async {
            let fetcher = SubjectFetcher::new(self.config.fetch.clone()).map_err(failed_at(stage))?;
            let subjects = fetcher
                .fetch_all(&self.config.api_token)
                .await
                .map_err(failed_at(stage))?;

            snapshot::write_snapshot(
                self.config.snapshot_dir(),
                &self.config.snapshot_base,
                &subjects,
            )
            .map_err(failed_at(stage))
        }
        .instrument(info_span!("stage", stage = %stage))
        .await
    }

    /// Normalize a snapshot and write both tabular files
    pub async fn transform_stage(&self, snapshot_path: &Path) -> Result<TransformOutput> {
        let stage = PipelineStage::Transform;
        async {
            info!("Transforming {}", snapshot_path.display());
            let records = snapshot::read_snapshot(snapshot_path).map_err(failed_at(stage))?;
            let outcome = normalize_records(&records).map_err(failed_at(stage))?;

            let csv_path = self.config.tabular_path(TabularFormat::Csv);
            let parquet_path = self.config.tabular_path(TabularFormat::Parquet);
            tabular::write_rows(&outcome.rows, &csv_path, TabularFormat::Csv)
                .map_err(failed_at(stage))?;
            tabular::write_rows(&outcome.rows, &parquet_path, TabularFormat::Parquet)
                .map_err(failed_at(stage))?;

            Ok(TransformOutput {
                normalized_rows: outcome.rows.len(),
                skipped: outcome.skipped,
                csv_path,
                parquet_path,
            })
        }
        .instrument(info_span!("stage", stage = %stage))
        .await
    }

    /// Replace the subjects table with `source` and rebuild the views
    pub async fn load_stage(&self, source: &Path) -> Result<u64> {
        let stage = PipelineStage::Load;
        async {
            let settings = self.config.require_database().map_err(failed_at(stage))?;
            let loader = SubjectLoader::connect(settings).await.map_err(failed_at(stage))?;
            loader
                .load(source, &self.config.table_name)
                .await
                .map_err(failed_at(stage))
        }
        .instrument(info_span!("stage", stage = %stage))
        .await
    }

    /// Build every deck package from the views
    pub async fn generate_stage(&self) -> Result<BTreeMap<DeckKind, PathBuf>> {
        let stage = PipelineStage::Generate;
        async {
            let settings = self.config.require_database().map_err(failed_at(stage))?;
            let pool = settings.connect().await.map_err(failed_at(stage))?;
            let builder =
                DeckBuilder::new(pool, self.config.deck_dir.clone()).map_err(failed_at(stage))?;
            builder.build_all().await.map_err(failed_at(stage))
        }
        .instrument(info_span!("stage", stage = %stage))
        .await
    }
}
