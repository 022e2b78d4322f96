//! wkdeck - WaniKani to Anki pipeline

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use wkdeck_common::logging::{init_logging, LogConfig, LogLevel};
use wkdeck_ingest::snapshot::{self, CacheStatus};
use wkdeck_ingest::{Pipeline, PipelineConfig, RunOptions, TabularFormat};

#[derive(Parser, Debug)]
#[command(name = "wkdeck")]
#[command(author, version, about = "Build Anki decks from your WaniKani subjects")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory for snapshots and tabular files
    #[arg(long, global = true, env = "WKDECK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory for generated decks
    #[arg(long, global = true, env = "WKDECK_DECK_DIR")]
    deck_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the whole pipeline (default)
    Run(RunArgs),

    /// Fetch all subjects and write a snapshot
    Fetch,

    /// Normalize a snapshot into CSV and Parquet
    Transform {
        /// Snapshot to transform; defaults to the newest one
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Load a tabular file into the database and rebuild the views
    Load {
        /// CSV or Parquet file; defaults to the CSV in the data directory
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Generate the Anki packages from the database views
    Decks,

    /// Report whether a reusable snapshot exists
    CacheStatus {
        #[arg(long)]
        max_cache_age_days: Option<u32>,
    },
}

#[derive(clap::Args, Debug, Default)]
struct RunArgs {
    /// Always fetch, ignoring any snapshot
    #[arg(long)]
    no_cache: bool,

    /// Fetch even if a fresh snapshot exists
    #[arg(long)]
    force_refresh: bool,

    /// Snapshots younger than this many days are reused
    #[arg(long)]
    max_cache_age_days: Option<u32>,
}

impl RunArgs {
    fn apply(&self, mut options: RunOptions) -> RunOptions {
        if self.no_cache {
            options.use_cache = false;
        }
        if self.force_refresh {
            options.force_refresh = true;
        }
        if let Some(days) = self.max_cache_age_days {
            options.max_cache_age_days = days;
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("wkdeck")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    match execute(cli).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("{:#}", e);
            Ok(ExitCode::FAILURE)
        },
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Command::Run(RunArgs::default()));

    let mut config = match command {
        Command::Run(_) => PipelineConfig::from_env(),
        _ => PipelineConfig::from_env_unchecked(),
    }
    .context("Invalid configuration")?;

    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.deck_dir {
        config.deck_dir = dir;
    }

    let pipeline = Pipeline::new(config);

    match command {
        Command::Run(args) => {
            let options = args.apply(pipeline.config().run);
            let report = pipeline.run(options).await?;

            info!("Snapshot: {}", report.snapshot.display());
            info!(
                "Normalized {} subjects ({} skipped)",
                report.normalized_rows,
                report.skipped.len()
            );
            info!("Loaded {} rows", report.rows_loaded);
            for (kind, path) in &report.decks {
                info!("  {}: {}", kind, path.display());
            }
        },
        Command::Fetch => {
            let path = pipeline.fetch_stage().await?;
            info!("Snapshot written to {}", path.display());
        },
        Command::Transform { snapshot } => {
            let config = pipeline.config();
            let path = match snapshot {
                Some(path) => path,
                None => match snapshot::find_latest_snapshot(
                    config.snapshot_dir(),
                    &config.snapshot_base,
                )? {
                    Some(path) => path,
                    None => bail!(
                        "No snapshot found in {}; run `wkdeck fetch` first",
                        config.snapshot_dir().display()
                    ),
                },
            };

            let output = pipeline.transform_stage(&path).await?;
            info!(
                "Wrote {} rows to {} and {}",
                output.normalized_rows,
                output.csv_path.display(),
                output.parquet_path.display()
            );
            if !output.skipped.is_empty() {
                warn!("{} subjects were skipped", output.skipped.len());
            }
        },
        Command::Load { source } => {
            let source =
                source.unwrap_or_else(|| pipeline.config().tabular_path(TabularFormat::Csv));
            let rows = pipeline.load_stage(&source).await?;
            info!("Loaded {} rows from {}", rows, source.display());
        },
        Command::Decks => {
            let decks = pipeline.generate_stage().await?;
            for (kind, path) in &decks {
                info!("  {}: {}", kind, path.display());
            }
        },
        Command::CacheStatus { max_cache_age_days } => {
            let config = pipeline.config();
            let max_age = max_cache_age_days.unwrap_or(config.run.max_cache_age_days);
            match snapshot::check_cache(config.snapshot_dir(), &config.snapshot_base, max_age) {
                CacheStatus::Fresh { path, age_days } => {
                    info!("Fresh snapshot ({} days old): {}", age_days, path.display())
                },
                CacheStatus::Stale { path, age_days } => info!(
                    "Stale snapshot ({} days old, max {}): {}",
                    age_days,
                    max_age,
                    path.display()
                ),
                CacheStatus::Missing => info!("No snapshot in {}", config.snapshot_dir().display()),
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags_override_options() {
        let cli = Cli::parse_from(["wkdeck", "run", "--force-refresh", "--max-cache-age-days", "2"]);
        let Some(Command::Run(args)) = cli.command else {
            panic!("expected run");
        };
        let options = args.apply(RunOptions::default());
        assert!(options.force_refresh);
        assert!(options.use_cache);
        assert_eq!(options.max_cache_age_days, 2);
    }

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["wkdeck", "--verbose"]);
        assert!(cli.command.is_none());
        assert!(cli.verbose);
    }
}
