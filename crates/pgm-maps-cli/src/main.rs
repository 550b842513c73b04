mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pgm_maps_github::GitHubMapFetcher;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Settings;

const DEFAULT_LOG_FILTER: &str = "pgm_maps=info,pgm_maps_github=info,pgm_map_sync=info";

#[derive(Parser)]
#[command(name = "pgm-map-sync")]
#[command(about = "Sync PGM map images from GitHub repositories into a local folder")]
struct Cli {
    /// Sources list (defaults to sources.json)
    #[arg(long, global = true)]
    sources: Option<PathBuf>,
    /// Output directory (defaults to Maps)
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
    /// Settings file (defaults to pgm-maps.toml when present)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Download new or changed maps (the default)
    Sync {
        /// Report what would be downloaded without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// List the maps each source exposes
    List,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn github_token() -> Option<String> {
    std::env::var("GITHUB_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let settings =
        Settings::load(cli.settings.as_deref())?.with_overrides(cli.sources, cli.out_dir);

    let token = github_token();
    if token.is_none() {
        tracing::warn!(
            "No GITHUB_TOKEN provided. You may be rate limited more often and will not be able to access private repositories."
        );
    }

    let fetcher = GitHubMapFetcher::new(settings.fetcher_config(token));

    match cli.command.unwrap_or(Command::Sync { dry_run: false }) {
        Command::Sync { dry_run } => {
            commands::sync::run(&settings.sources_file, &settings.out_dir, &fetcher, dry_run)
                .await
                .map(|_| ())
        }
        Command::List => commands::list::run(&settings.sources_file, &fetcher).await,
    }
}
