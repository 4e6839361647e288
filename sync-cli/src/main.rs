//! # neosync
//!
//! Publish a static site directory to Neocities.
//!
//! ## Commands
//!
//! - `deploy`: Upload new and changed files (optionally delete stale ones)
//! - `list`: Show what the site currently serves
//! - `scan`: Show the local inventory without touching the network
//!
//! ## Example
//!
//! ```bash
//! export NEOCITIES_API_KEY=...
//!
//! # See what would change
//! neosync deploy --dry-run
//!
//! # Upload changes and remove files no longer present locally
//! neosync deploy --full-refresh
//!
//! # Only the music directory, including the excluded music category
//! neosync deploy --scope music --include music
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod manifest;

use commands::{deploy, list, scan};
use config::SiteConfig;

/// Publish a static site directory to Neocities.
#[derive(Parser, Debug)]
#[command(name = "neosync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./neosync.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Content root to publish (overrides `source` in the config)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Use an in-memory mock site instead of the Neocities API (for testing/demo)
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload new and changed files
    Deploy(DeployArgs),

    /// List files on the remote site
    List {
        /// Only list files under this directory
        #[arg(long)]
        scope: Option<String>,
    },

    /// Print the local inventory
    Scan {
        /// Only scan this directory
        #[arg(long)]
        scope: Option<String>,
    },
}

/// Flags for `deploy`.
#[derive(Args, Debug, Clone, Default)]
pub struct DeployArgs {
    /// Print the plan without uploading or deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Also delete remote files that no longer exist locally
    #[arg(long)]
    pub full_refresh: bool,

    /// Upload every file even when the remote copy is identical
    #[arg(long)]
    pub force: bool,

    /// Opt an excluded category back in (repeatable)
    #[arg(long = "include", value_name = "CATEGORY")]
    pub include: Vec<String>,

    /// Only sync files under this directory
    #[arg(long)]
    pub scope: Option<String>,

    /// Delete without asking
    #[arg(long, short)]
    pub yes: bool,

    /// Seconds between API calls
    #[arg(long, value_name = "SECONDS")]
    pub rate_limit: Option<f64>,

    /// Retries after a failed upload or delete
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Paths per delete request
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Skip the release manifest check
    #[arg(long)]
    pub skip_manifest_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = SiteConfig::load(cli.config.as_deref()).await?;
    if let Some(source) = cli.source {
        config.source = source;
    }

    match cli.command {
        Commands::Deploy(args) => {
            deploy::run(&config, &args, cli.mock, cli.verbose).await?;
        }
        Commands::List { scope } => {
            list::run(&config, scope.as_deref(), cli.mock).await?;
        }
        Commands::Scan { scope } => {
            scan::run(&config, scope.as_deref())?;
        }
    }

    Ok(())
}
