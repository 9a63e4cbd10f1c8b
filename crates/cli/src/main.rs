//! Real Estate Estimator CLI
//!
//! A command-line tool for training the per-category estimation models
//! and producing investment reports for development projects.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{catalog, predict, train};
use estimator_lib::TrainingScheduler;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Real Estate Estimator CLI
#[derive(Parser)]
#[command(name = "reest")]
#[command(author, version, about = "CLI for the Real Estate Estimator", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/reest/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Print Prometheus metrics after the command
    #[arg(long, global = true)]
    pub show_metrics: bool,

    /// Seed for reproducible training (fresh entropy when omitted)
    #[arg(long, global = true, env = "REEST_SEED")]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate the financials of a project
    Predict(predict::PredictArgs),

    /// Train category models and show fit diagnostics
    Train(train::TrainArgs),

    /// List project categories
    Categories,

    /// List known locations and land prices
    Locations,
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let mut config = config::Config::load(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.training.seed = Some(seed);
    }
    debug!(training = ?config.training, "Configuration loaded");

    let registry = Arc::new(config.registry()?);
    let scheduler = TrainingScheduler::new(Arc::clone(&registry));

    match cli.command {
        Commands::Predict(args) => predict::run(&scheduler, args, cli.format).await?,
        Commands::Train(args) => train::run(&scheduler, args, cli.format).await?,
        Commands::Categories => catalog::list_categories(&registry, cli.format)?,
        Commands::Locations => catalog::list_locations(&registry, cli.format)?,
    }

    if cli.show_metrics {
        print!("{}", registry.metrics().render());
    }

    Ok(())
}
