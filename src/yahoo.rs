//! Yahoo Finance options data.
//!
//! Expirations and chains come from the unofficial v7 options endpoint.
//! Data is delayed and intended for personal use.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, ScanError};
use crate::models::{OptionChain, StrikeRecord};
use crate::provider::MarketData;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v7/finance";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance API client
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ScanError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_chain(&self, underlying: &str, date: Option<i64>) -> Result<ChainData> {
        let url = format!("{}/options/{}", self.base_url, underlying);
        let mut request = self.client.get(&url);
        if let Some(ts) = date {
            request = request.query(&[("date", ts)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ScanError::transient(underlying, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::transient(underlying, format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScanError::transient(underlying, e))?;

        parse_chain(underlying, &body)
    }
}

#[async_trait]
impl MarketData for YahooClient {
    async fn expirations(&self, underlying: &str) -> Result<Vec<NaiveDate>> {
        let chain = self.fetch_chain(underlying, None).await?;
        let expirations = expiration_dates(&chain);

        debug!(underlying, count = expirations.len(), "Fetched expirations");
        Ok(expirations)
    }

    async fn option_chain(&self, underlying: &str, expiration: NaiveDate) -> Result<OptionChain> {
        let ts = expiration.and_time(NaiveTime::MIN).and_utc().timestamp();
        let data = self.fetch_chain(underlying, Some(ts)).await?;

        let chain = data
            .options
            .into_iter()
            .next()
            .map(|o| OptionChain {
                calls: o.calls,
                puts: o.puts,
            })
            .unwrap_or_default();

        debug!(
            underlying,
            %expiration,
            calls = chain.calls.len(),
            puts = chain.puts.len(),
            "Fetched option chain"
        );
        Ok(chain)
    }
}

// Yahoo Finance API response structures

#[derive(Debug, Deserialize)]
struct OptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: OptionChainResult,
}

#[derive(Debug, Deserialize)]
struct OptionChainResult {
    result: Vec<ChainData>,
}

#[derive(Debug, Deserialize)]
struct ChainData {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<ChainOptions>,
}

#[derive(Debug, Deserialize)]
struct ChainOptions {
    #[serde(default)]
    calls: Vec<StrikeRecord>,
    #[serde(default)]
    puts: Vec<StrikeRecord>,
}

fn parse_chain(underlying: &str, body: &str) -> Result<ChainData> {
    let response: OptionsResponse =
        serde_json::from_str(body).map_err(|e| ScanError::transient(underlying, e))?;

    response
        .option_chain
        .result
        .into_iter()
        .next()
        .ok_or_else(|| ScanError::unavailable(underlying))
}

fn expiration_dates(chain: &ChainData) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = chain
        .expiration_dates
        .iter()
        .filter_map(|&ts| DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()))
        .collect();
    dates.sort();
    dates.dedup();
    dates
}
