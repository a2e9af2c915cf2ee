use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio::time::Instant;

use parity_arbitrage_scanner::{AlpacaClient, Config, Credentials, ExpirationPolicy, SpreadScanner, YahooClient};

/// Scan one underlying for put-call parity mispricings
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Underlying symbol (3 or 4 characters)
    #[arg(short, long)]
    symbol: Option<String>,

    /// Annual risk-free rate, e.g. 0.054465
    #[arg(short, long)]
    rate: Option<f64>,

    /// Index into the listed expirations, 0 is the nearest
    #[arg(short, long)]
    expiration_index: Option<usize>,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(symbol) = &args.symbol {
        config.underlying = symbol.to_uppercase();
    }
    if let Some(rate) = args.rate {
        config.risk_free_rate = rate;
    }
    if let Some(index) = args.expiration_index {
        config.expiration = ExpirationPolicy::Index(index);
    }

    config.validate()?;
    Ok(config)
}

fn credentials_from_env() -> Result<Credentials> {
    Ok(Credentials {
        api_key: std::env::var("ALPACA_API_KEY").context("ALPACA_API_KEY is not set")?,
        api_secret: std::env::var("ALPACA_API_SECRET").context("ALPACA_API_SECRET is not set")?,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = load_config(&args).context("invalid configuration")?;
    config.logging.init();

    println!("Put-Call Parity Scanner");
    println!("=======================\n");

    let quotes = AlpacaClient::new(
        config.alpaca.data_url.clone(),
        config.alpaca.feed.clone(),
        credentials_from_env()?,
    );
    let market_data = YahooClient::new(config.yahoo.base_url.clone())?;
    let scanner = SpreadScanner::new(market_data, quotes, config);

    let start = Instant::now();
    let report = scanner.scan().await.context("scan aborted")?;

    report.print();

    println!(
        "\n[{}] Scan completed in {:.2}s | {} evaluated | {} skipped",
        Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
        start.elapsed().as_secs_f64(),
        report.evaluations.len(),
        report.failures.len()
    );

    Ok(())
}
