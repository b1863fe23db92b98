use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::*;
use config::Config;

#[derive(Parser)]
#[command(name = "flightcache")]
#[command(author, version, about = "Cached flight delay analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use an in-process cache instead of the Redis server
    #[arg(long, global = true)]
    in_memory: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every query twice and report cache speedup
    Demo,

    /// Run a single query
    Query {
        /// Query to run
        #[arg(value_enum)]
        kind: QueryKind,

        /// Delay column (arr, dep) or airport column (origin, dest)
        #[arg(long)]
        column: Option<String>,
    },

    /// Show cache statistics
    Stats,

    /// Remove every cached entry
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose)?;

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };
    let config = config.with_env()?;
    info!(
        csv_path = ?config.csv_path,
        ttl_secs = config.cache_ttl,
        in_memory = cli.in_memory,
        "Configuration loaded"
    );

    print_banner();

    let analyzer = build_analyzer(&config, cli.in_memory).await?;

    match cli.command {
        Some(Commands::Query { kind, column }) => {
            run_query(&analyzer, kind, column.as_deref()).await?;
        }
        Some(Commands::Stats) => {
            show_stats(&analyzer).await?;
        }
        Some(Commands::Clear) => {
            clear_cache(&analyzer).await?;
        }
        Some(Commands::Demo) | None => {
            run_demo(&analyzer).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        "flightcache_cli=debug,flightcache_analyzer=debug,flightcache_store=debug,flightcache_storage=debug"
    } else {
        "flightcache_cli=info,flightcache_analyzer=info,flightcache_store=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

fn print_banner() {
    println!("{}", "Flight Delay Analytics".bright_cyan().bold());
    println!(
        "{}",
        format!("flightcache v{}", env!("CARGO_PKG_VERSION")).bright_yellow()
    );
    println!();
}
