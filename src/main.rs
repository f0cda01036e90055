use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};

mod analysis;
mod collector;
mod config;
mod error;
mod models;
mod scrapers;
mod storage;

use config::{Config, FetcherKind};
use scrapers::{BrowserFetcher, HttpFetcher, PageFetcher};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect pricing and availability data for the configured properties
    Scrape,
    /// Analyze collected data and write the market intelligence report
    Analyze,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;
    config.ensure_directories()?;

    match args.command {
        Command::Scrape => {
            info!("🏨 Pricing Scraper - {}", config.mode.display_name());
            info!("==========================================");

            if config.properties.is_empty() {
                anyhow::bail!(
                    "No properties configured - add a properties list to {}",
                    args.config.display()
                );
            }

            let fetcher: Box<dyn PageFetcher> = match config.fetcher {
                FetcherKind::Browser => Box::new(BrowserFetcher::new(&config)?),
                FetcherKind::Http => Box::new(HttpFetcher::new(&config)?),
            };
            collector::run_collection(&config, fetcher.as_ref()).await?;
        }
        Command::Analyze => {
            info!("📊 Pricing Analysis - {}", config.mode.display_name());
            info!("==========================================");

            analysis::run_analysis(&config)?;
        }
    }

    Ok(())
}
