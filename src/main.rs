//! pooldash - live terminal dashboard for Ethereum-style mining pools
//!
//! Polls a pool's HTTP API and a price feed, derives the dashboard views
//! (round share, fiat earnings, today's blocks, miner ranking) and keeps them
//! fresh on a fixed refresh interval.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;

mod aggregate;
mod commands;
mod config;
mod contexts;
mod error;
mod models;
mod policy;
mod pool_api;
mod quote;
mod scheduler;

use commands::{account, blocks, miners, payments, stats, ViewOptions};
use contexts::Clients;
use policy::LogReporter;
use scheduler::Scheduler;

/// pooldash - mining pool dashboard
#[derive(Parser)]
#[command(name = "pooldash")]
#[command(version)]
#[command(about = "Live mining pool stats, accounts, blocks and payouts", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pool API base URL (overrides config file)
    #[arg(long, global = true, env = "POOLDASH_API_URL")]
    api_url: Option<String>,

    /// Coin ticker used for price quotes (overrides config file)
    #[arg(long, global = true, env = "POOLDASH_COIN")]
    coin: Option<String>,

    /// Keep refreshing until Ctrl+C
    #[arg(short, long, global = true)]
    watch: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Pool-wide stats, coin price and connection details
    Stats,

    /// Look up a miner account
    Account {
        /// Miner login (wallet address)
        login: String,
    },

    /// Recently found blocks by maturity
    Blocks {
        /// Blocks to show per list
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Pool payout history
    Payments {
        /// Number of payments to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Connected miners ranked by hashrate
    Miners {
        /// Number of miners to show
        #[arg(long, default_value = "25")]
        limit: usize,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,

        /// Write the default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Config { path, init } = cli.command {
        return show_config(path, init);
    }

    // Resolved once, read-only from here on
    let config = Arc::new(config::load_config()?.with_overrides(cli.api_url, cli.coin));
    tracing::debug!(api_url = %config.api_url, coin = %config.coin_name, "config loaded");

    let clients = Clients::new(config.clone())?;
    let scheduler = Scheduler::new(config.refresh_interval(), Arc::new(LogReporter));
    let options = ViewOptions {
        watch: cli.watch,
        json: cli.json,
    };

    match cli.command {
        Commands::Stats => stats::execute(clients, &scheduler, options).await?,
        Commands::Account { login } => {
            account::execute(clients, &scheduler, login, options).await?
        }
        Commands::Blocks { limit } => blocks::execute(clients, &scheduler, limit, options).await?,
        Commands::Payments { limit } => {
            payments::execute(clients, &scheduler, limit, options).await?
        }
        Commands::Miners { limit } => miners::execute(clients, &scheduler, limit, options).await?,
        Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn show_config(path: bool, init: bool) -> Result<()> {
    let config_path = config::get_config_path()?;

    if path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!(
                "{} {}",
                "Config already exists:".yellow(),
                config_path.display()
            );
        } else {
            config::save_config(&config::Config::new())?;
            println!("{} {}", "✓".green(), config_path.display());
        }
        return Ok(());
    }

    println!("Config file: {}", config_path.display());
    if !config_path.exists() {
        println!("(not created yet - using defaults, run 'pooldash config --init' to write them)");
    }
    let config = config::load_config()?;
    println!("\n{}", toml::to_string_pretty(&config)?);

    Ok(())
}
