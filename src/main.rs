//! Price Sentinel main entry point
//!
//! This is the command-line interface for the Price Sentinel price tracker.

use anyhow::{Context, Result};
use clap::Parser;
use price_sentinel::config::{load_config, Config};
use price_sentinel::output::{print_batch_report, print_statistics};
use price_sentinel::recipe::load_recipes_from_dir;
use price_sentinel::storage::{open_store, PriceStore};
use price_sentinel::url::{extract_domain, parse_http_url};
use price_sentinel::Engine;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Price Sentinel: a polite price tracker
///
/// Price Sentinel fetches product pages while respecting robots.txt and rate
/// limits, extracts prices with per-site recipes, stores the history in SQLite
/// and alerts when a price drops.
#[derive(Parser, Debug)]
#[command(name = "price-sentinel")]
#[command(version)]
#[command(about = "A polite price tracker", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Process these URLs instead of the configured watch list
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,

    /// Validate config and recipes and show what would be fetched
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let targets = resolve_targets(&config, &cli.urls)?;

    if cli.dry_run {
        handle_dry_run(&config, &targets)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_run(&config, &targets).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("price_sentinel=info,warn"),
            1 => EnvFilter::new("price_sentinel=debug,info"),
            2 => EnvFilter::new("price_sentinel=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// URLs given on the command line, else the configured watch list
fn resolve_targets(config: &Config, cli_urls: &[String]) -> Result<Vec<Url>> {
    let raw: Vec<&str> = if cli_urls.is_empty() {
        config.watch.iter().map(|w| w.url.as_str()).collect()
    } else {
        cli_urls.iter().map(String::as_str).collect()
    };

    raw.into_iter()
        .map(|u| parse_http_url(u).with_context(|| format!("invalid URL '{}'", u)))
        .collect()
}

/// Handles the --dry-run mode: validates config and recipes without fetching
fn handle_dry_run(config: &Config, targets: &[Url]) -> Result<()> {
    println!("=== Price Sentinel Dry Run ===\n");

    println!("User Agent:");
    println!("  Identity: {}", config.user_agent.identity());
    println!("  Rotation pool: {}", config.user_agent.rotate.len());

    println!("\nPoliteness:");
    println!("  Respect robots.txt: {}", config.fetcher.respect_robots);
    println!(
        "  Requests per minute: {}",
        config.rate_limit.requests_per_minute
    );
    println!("  Global delay: {}ms", config.rate_limit.global_delay_ms);
    println!(
        "  Retries: {} (x{} backoff, {}ms..{}ms)",
        config.retry.max_retries,
        config.retry.backoff_factor,
        config.retry.initial_delay_ms,
        config.retry.max_delay_ms
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let recipes = load_recipes_from_dir(Path::new(&config.recipes.directory))?;
    println!(
        "\nRecipes ({}) from {}:",
        recipes.len(),
        config.recipes.directory
    );
    for recipe in recipes.iter() {
        println!("  - {}", recipe.domain());
    }

    println!("\nTargets ({}):", targets.len());
    let mut uncovered = 0;
    for url in targets {
        let recipe = extract_domain(url).and_then(|host| recipes.find(&host));
        match recipe {
            Some(r) => println!("  * {} -> {}", url, r.domain()),
            None => {
                uncovered += 1;
                println!("  * {} -> (no recipe)", url);
            }
        }
    }

    println!("\n✓ Configuration is valid");
    if uncovered > 0 {
        println!("! {} target(s) have no matching recipe", uncovered);
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = open_store(Path::new(&config.output.database_path))?;
    print_statistics(&store.stats()?);

    Ok(())
}

/// Handles the main run: every target through the pipeline once
async fn handle_run(config: &Config, targets: &[Url]) -> Result<()> {
    if targets.is_empty() {
        tracing::warn!("No URLs to process; add [[watch]] entries or pass --url");
        return Ok(());
    }

    let engine = Engine::from_config(config).context("failed to start pipeline")?;
    tracing::info!(
        "Processing {} URLs with {} recipes",
        targets.len(),
        engine.recipes().len()
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping");
            on_signal.cancel();
        }
    });

    let report = engine.process_batch_with_cancel(targets, &cancel).await;
    print_batch_report(&report);

    Ok(())
}
