//! Pipeline configuration
//!
//! Built once at process start from the environment (and an optional
//! `.env` file) and handed to each stage by reference.

use crate::deck::DeckKind;
use crate::fetch::FetchSettings;
use crate::loader::{validate_table_name, DatabaseSettings};
use crate::tabular::TabularFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wkdeck_common::env::{env_flag, env_or, env_parse, env_var};
use wkdeck_common::{Result, WkError};

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_API_BASE_URL: &str = "https://api.wanikani.com/v2";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_MAX_RETRIES: u32 = 3;
pub const DEFAULT_API_RETRY_DELAY_SECS: u64 = 5;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_DECK_DIR: &str = "./ankidecks";
pub const DEFAULT_SNAPSHOT_BASE: &str = "wanikani_subjects_cache";
pub const DEFAULT_TABLE_NAME: &str = "wanikani_subjects";
pub const DEFAULT_MAX_CACHE_AGE_DAYS: u32 = 7;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Base name of the tabular outputs inside the data directory
pub const TABULAR_FILE_STEM: &str = "wanikani_subjects";

/// Caller-controlled cache behaviour for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Allow reusing a recent snapshot at all
    pub use_cache: bool,
    /// Fetch even when a fresh snapshot exists
    pub force_refresh: bool,
    /// Snapshots younger than this many whole days are fresh
    pub max_cache_age_days: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
            max_cache_age_days: DEFAULT_MAX_CACHE_AGE_DAYS,
        }
    }
}

impl RunOptions {
    /// Whether the cache should be consulted before fetching
    pub fn consults_cache(&self) -> bool {
        self.use_cache && !self.force_refresh
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// WaniKani personal access token
    pub api_token: String,
    pub fetch: FetchSettings,
    pub database: DatabaseSettings,
    /// Snapshots and tabular outputs live here
    pub data_dir: PathBuf,
    /// Packaged decks are written here
    pub deck_dir: PathBuf,
    /// Snapshot files are named `<snapshot_base>_<YYYY-MM-DD>.json`
    pub snapshot_base: String,
    /// Destination table for the loader
    pub table_name: String,
    /// Defaults for the three run options
    pub run: RunOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            fetch: FetchSettings::default(),
            database: DatabaseSettings::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            deck_dir: PathBuf::from(DEFAULT_DECK_DIR),
            snapshot_base: DEFAULT_SNAPSHOT_BASE.to_string(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            run: RunOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from the environment and validate
    ///
    /// - `WANIKANI_TOKEN` (required)
    /// - `DATABASE_URL` (required)
    /// - `WANIKANI_API_BASE_URL`
    /// - `WKDECK_DATA_DIR`, `WKDECK_DECK_DIR`, `WKDECK_SNAPSHOT_BASE`, `WKDECK_TABLE`
    /// - `WKDECK_MAX_CACHE_AGE_DAYS`, `WKDECK_FORCE_REFRESH`, `WKDECK_USE_CACHE`
    /// - `WKDECK_API_TIMEOUT_SECS`, `WKDECK_API_MAX_RETRIES`, `WKDECK_API_RETRY_DELAY_SECS`
    /// - `WKDECK_DB_MAX_CONNECTIONS`
    pub fn from_env() -> Result<Self> {
        let config = Self::from_env_unchecked()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the environment without the completeness checks
    ///
    /// For single-stage commands that need only part of the settings, e.g.
    /// a transform that never talks to the API or the database.
    pub fn from_env_unchecked() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            api_token: env_var("WANIKANI_TOKEN").unwrap_or_default(),
            fetch: FetchSettings {
                base_url: env_or("WANIKANI_API_BASE_URL", DEFAULT_API_BASE_URL),
                timeout: Duration::from_secs(env_parse(
                    "WKDECK_API_TIMEOUT_SECS",
                    DEFAULT_API_TIMEOUT_SECS,
                )?),
                max_retries: env_parse("WKDECK_API_MAX_RETRIES", DEFAULT_API_MAX_RETRIES)?,
                retry_delay: Duration::from_secs(env_parse(
                    "WKDECK_API_RETRY_DELAY_SECS",
                    DEFAULT_API_RETRY_DELAY_SECS,
                )?),
            },
            database: DatabaseSettings {
                url: env_var("DATABASE_URL").unwrap_or_default(),
                max_connections: env_parse(
                    "WKDECK_DB_MAX_CONNECTIONS",
                    DEFAULT_DB_MAX_CONNECTIONS,
                )?,
            },
            data_dir: PathBuf::from(env_or("WKDECK_DATA_DIR", DEFAULT_DATA_DIR)),
            deck_dir: PathBuf::from(env_or("WKDECK_DECK_DIR", DEFAULT_DECK_DIR)),
            snapshot_base: env_or("WKDECK_SNAPSHOT_BASE", DEFAULT_SNAPSHOT_BASE),
            table_name: env_or("WKDECK_TABLE", DEFAULT_TABLE_NAME),
            run: RunOptions {
                use_cache: env_flag("WKDECK_USE_CACHE", true)?,
                force_refresh: env_flag("WKDECK_FORCE_REFRESH", false)?,
                max_cache_age_days: env_parse(
                    "WKDECK_MAX_CACHE_AGE_DAYS",
                    DEFAULT_MAX_CACHE_AGE_DAYS,
                )?,
            },
        })
    }

    /// Reject configurations that would fail mid-run
    pub fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            return Err(WkError::config(
                "WaniKani API token not configured. Set WANIKANI_TOKEN",
            ));
        }
        if self.database.url.is_empty() {
            return Err(WkError::config("Database URL not configured. Set DATABASE_URL"));
        }
        if self.fetch.max_retries == 0 {
            return Err(WkError::config("WKDECK_API_MAX_RETRIES must be greater than 0"));
        }
        if self.fetch.timeout.is_zero() {
            return Err(WkError::config("WKDECK_API_TIMEOUT_SECS must be greater than 0"));
        }
        if self.fetch.base_url.is_empty() {
            return Err(WkError::config("WANIKANI_API_BASE_URL cannot be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(WkError::config("WKDECK_DB_MAX_CONNECTIONS must be greater than 0"));
        }
        if self.snapshot_base.is_empty() || self.snapshot_base.contains(['/', '\\']) {
            return Err(WkError::config(format!(
                "WKDECK_SNAPSHOT_BASE must be a plain file name prefix, got {:?}",
                self.snapshot_base
            )));
        }
        validate_table_name(&self.table_name)
            .map_err(|e| WkError::config(format!("WKDECK_TABLE: {e}")))?;
        Ok(())
    }

    /// Where a tabular output of the given format is written
    pub fn tabular_path(&self, format: TabularFormat) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", TABULAR_FILE_STEM, format.extension()))
    }

    /// Where the package for one deck kind is written
    pub fn deck_path(&self, kind: DeckKind) -> PathBuf {
        self.deck_dir.join(kind.file_name())
    }

    pub fn snapshot_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Fail early when a stage needs the database but none is configured
    pub fn require_database(&self) -> Result<&DatabaseSettings> {
        if self.database.url.is_empty() {
            return Err(WkError::config("Database URL not configured. Set DATABASE_URL"));
        }
        Ok(&self.database)
    }
}
