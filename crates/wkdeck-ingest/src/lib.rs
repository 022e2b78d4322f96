//! WaniKani to Anki pipeline
//!
//! Pulls every subject (radical, kanji, vocabulary) from the WaniKani v2
//! API, flattens them into tabular files, loads those into PostgreSQL and
//! builds Anki flashcard packages from per-category views.
//!
//! # Stages
//!
//! - [`fetch`]: paginated API client with retry handling
//! - [`snapshot`]: dated JSON snapshots and cache freshness
//! - [`normalize`]: raw records to [`subject::NormalizedRow`]
//! - [`tabular`]: CSV and Parquet outputs
//! - [`loader`]: table replacement and view rebuild
//! - [`deck`]: `.apkg` generation
//! - [`pipeline`]: runs the stages in order
//!
//! # Example
//!
//! ```no_run
//! use wkdeck_ingest::{Pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::from_env()?;
//!     let options = config.run;
//!     let report = Pipeline::new(config).run(options).await?;
//!     tracing::info!("{} rows loaded", report.rows_loaded);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod deck;
pub mod fetch;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod snapshot;
pub mod subject;
pub mod tabular;

pub use config::{PipelineConfig, RunOptions};
pub use deck::{DeckBuilder, DeckKind};
pub use fetch::{FetchError, FetchSettings, SubjectFetcher};
pub use loader::{DatabaseSettings, LoadError, SubjectLoader};
pub use normalize::{normalize_records, NormalizeOutcome, SkippedRecord};
pub use pipeline::{Pipeline, PipelineError, PipelineReport, PipelineStage};
pub use tabular::{FlatRow, TabularFormat};
