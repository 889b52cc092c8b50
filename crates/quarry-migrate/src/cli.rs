//! Command-line surface for applications that embed their own registry.
//!
//! ```rust,ignore
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = quarry_migrate::Registry::new()
//!         .with_migration("migration_2024_03_01_CreateUsers_1709251200", || CreateUsers);
//!     quarry_migrate::cli::run(registry).await
//! }
//! ```
//!
//! ```bash
//! app migrate --seeds
//! app rollback --batch 3
//! app export --dir build/sql
//! app status
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::MigratorConfig;
use crate::runner::Runner;
use crate::unit::Registry;

/// Batched, reversible database migrations.
#[derive(Debug, Parser)]
#[command(name = "quarry-migrate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database URL (`sqlite:`, `postgres://` or `mysql://`).
    #[arg(short, long, env = "DATABASE_URL")]
    pub database: Option<String>,

    /// JSON configuration file. Flags override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Bookkeeping table name.
    #[arg(long)]
    pub table: Option<String>,

    /// Disable the read cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending units as a new batch.
    Migrate {
        /// Run seeds after migrations.
        #[arg(long)]
        seeds: bool,
    },

    /// Revert a batch.
    Rollback {
        /// Batch to revert (the most recent one if not specified).
        #[arg(short, long)]
        batch: Option<i64>,
    },

    /// Write the pending SQL to a script instead of executing it.
    Export {
        /// Output directory (the configured export directory if not
        /// specified).
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Include seeds.
        #[arg(long)]
        seeds: bool,
    },

    /// Show every registered unit and its state.
    Status,
}

impl Cli {
    /// Builds the effective configuration: defaults, then the config file,
    /// then flags.
    pub fn resolve_config(&self) -> crate::Result<MigratorConfig> {
        let mut config = match &self.config {
            Some(path) => MigratorConfig::from_json_file(path)?,
            None => MigratorConfig::default(),
        };
        if let Some(database) = &self.database {
            config.database_url.clone_from(database);
        }
        if let Some(table) = &self.table {
            config.bookkeeping_table.clone_from(table);
        }
        if self.no_cache {
            config.query_cache = false;
        }
        match &self.command {
            Commands::Migrate { seeds: true } | Commands::Export { seeds: true, .. } => {
                config.include_seeds = true;
            }
            _ => {}
        }
        config.validate()?;
        Ok(config)
    }
}

/// Parses the process arguments and runs the selected command.
pub async fn run(registry: Registry) -> anyhow::Result<()> {
    run_with(Cli::parse(), registry).await
}

/// Runs an already parsed command line.
pub async fn run_with(cli: Cli, registry: Registry) -> anyhow::Result<()> {
    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.resolve_config()?;
    let mut runner = Runner::from_config(&config, registry)?;

    match cli.command {
        Commands::Migrate { .. } => {
            let report = runner.migrate().await?;
            if report.is_empty() {
                info!("No pending migrations.");
            } else {
                info!(
                    "Applied {} unit(s) in batch {}.",
                    report.applied.len(),
                    report.batch_id
                );
            }
        }

        Commands::Rollback { batch } => {
            let reverted = runner.rollback(batch).await?;
            info!("Reverted {} migration(s).", reverted.len());
        }

        Commands::Export { dir, seeds } => {
            let dir = dir.unwrap_or_else(|| config.export_dir.clone());
            let path = runner.export(&dir, seeds || config.include_seeds).await?;
            info!("Export written to {}", path.display());
        }

        Commands::Status => {
            let units = runner.status().await?;
            if units.is_empty() {
                info!("No units registered.");
            } else {
                println!("\nUnits:");
                println!("{:-<72}", "");
                for unit in &units {
                    let mark = if unit.status == crate::history::Status::Completed {
                        "X"
                    } else {
                        " "
                    };
                    let batch = unit
                        .batch_id
                        .map_or_else(String::new, |b| format!(" (batch {b})"));
                    println!(" [{mark}] {} [{}]{batch}", unit.identifier, unit.kind);
                }
                println!();
            }
        }
    }

    runner.connection().close().await;
    Ok(())
}
