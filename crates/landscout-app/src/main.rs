//! Landscout application shell.
//!
//! Loads configuration, opens the listing database and runs one search for a
//! profile. Core logic lives in the `landscout-*` crates.
//!
//! Site adapters are not part of this workspace. The binary is the harness
//! they plug into: an adapter implements `PropertySource` and is added to
//! `builtin_sources()`. Without any, a run records "No enabled property
//! sources" in its audit trail and reports zero listings.

use anyhow::{Context, Result};
use clap::Parser;
use landscout_browser::{ChromiumLauncher, PoolOptions};
use landscout_core::{AppConfig, Profile};
use landscout_db::Database;
use landscout_dedup::MatcherSet;
use landscout_search::{
    run_monitored_search, ConsoleNotifier, FileNotifier, Notifier, SearchOrchestrator,
};
use landscout_source::{PropertySource, SearchCallbacks, SourceError, SourceRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Aggregate, score and track rural land listings.
#[derive(Parser, Debug)]
#[command(name = "landscout", version)]
struct Cli {
    /// Configuration file; defaults to the platform config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Profile to search; defaults to the active profile
    #[arg(long)]
    profile: Option<String>,

    /// Report new and repriced listings since the profile's previous run
    #[arg(long)]
    monitor: bool,

    /// With --monitor, also append monitoring events as JSON lines to this file
    #[arg(long)]
    events: Option<PathBuf>,
}

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,landscout=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

/// Site adapters compiled into this build. Register adapters here.
fn builtin_sources() -> Vec<Arc<dyn PropertySource>> {
    Vec::new()
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::load_with_env().context("failed to load config")?,
    };
    Ok(config)
}

fn select_profile(config: &AppConfig, name: Option<&str>) -> Result<Profile> {
    let profile = config
        .search_profile(name)
        .context("cannot search with the selected profile")?;
    Ok(profile.clone())
}

fn notifier(events: Option<&Path>) -> Notifier {
    let notifier = Notifier::new().with_provider(Arc::new(ConsoleNotifier));
    match events {
        Some(path) => notifier.with_provider(Arc::new(FileNotifier::new(path))),
        None => notifier,
    }
}

fn logging_callbacks() -> SearchCallbacks {
    SearchCallbacks {
        on_progress: Some(Arc::new(|message: &str| info!("{}", message))),
        on_error: Some(Arc::new(|error: &SourceError| {
            tracing::warn!("source error: {}", error);
        })),
        on_property_found: None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    info!("Starting Landscout v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref())?;
    let profile = select_profile(&config, cli.profile.as_deref())?;

    let db_path = config.database_path()?;
    let db = Database::new(&db_path)
        .await
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    db.run_migrations().await?;

    let registry = SourceRegistry::with_sources(builtin_sources())?;
    if registry.count() == 0 {
        tracing::warn!("no site adapters compiled into this build; the run will find nothing");
    }
    let launcher = ChromiumLauncher::new(PoolOptions::from_config(&config.scraping));

    let orchestrator = SearchOrchestrator::new(
        Arc::new(registry),
        Arc::new(MatcherSet::default()),
        Arc::new(launcher),
        Arc::new(db),
    )
    .with_rate_limit(Duration::from_millis(config.scraping.default_rate_limit_ms));

    let callbacks = logging_callbacks();
    if cli.monitor {
        let notifier = notifier(cli.events.as_deref());
        let report = run_monitored_search(&orchestrator, &profile, &callbacks, &notifier).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let outcome = orchestrator.run(&profile, &callbacks).await?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    Ok(())
}
