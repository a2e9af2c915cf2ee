use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, ScanError};
use crate::provider::QuoteSource;
use crate::symbol::OptionIdentifier;

pub const DEFAULT_DATA_URL: &str = "https://data.alpaca.markets";
pub const DEFAULT_FEED: &str = "indicative";

/// Alpaca account credentials, supplied by the caller
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

/// Client for the Alpaca market data API
#[derive(Clone)]
pub struct AlpacaClient {
    client: reqwest::Client,
    base_url: String,
    feed: String,
    credentials: Credentials,
}

impl AlpacaClient {
    /// Creates a new Alpaca data client
    pub fn new(base_url: impl Into<String>, feed: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            feed: feed.into(),
            credentials,
        }
    }

    async fn get(&self, url: &str, query: &[(&str, &str)], symbol: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .header("APCA-API-KEY-ID", &self.credentials.api_key)
            .header("APCA-API-SECRET-KEY", &self.credentials.api_secret)
            .query(query)
            .send()
            .await
            .map_err(|e| ScanError::transient(symbol, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::transient(symbol, format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| ScanError::transient(symbol, e))
    }
}

#[async_trait]
impl QuoteSource for AlpacaClient {
    async fn latest_trade(&self, underlying: &str) -> Result<f64> {
        let url = format!("{}/v2/stocks/{}/trades/latest", self.base_url, underlying);
        let body = self.get(&url, &[], underlying).await?;
        let price = parse_latest_trade(underlying, &body)?;

        debug!(underlying, price, "Fetched latest trade");
        Ok(price)
    }

    async fn latest_ask(&self, option: &OptionIdentifier) -> Result<f64> {
        let symbol = option.token();
        let url = format!("{}/v1beta1/options/quotes/latest", self.base_url);
        let body = self
            .get(&url, &[("symbols", symbol.as_str()), ("feed", self.feed.as_str())], &symbol)
            .await?;
        let ask = parse_latest_ask(&symbol, &body)?;

        debug!(symbol = %symbol, ask, "Fetched option quote");
        Ok(ask)
    }
}

#[derive(Debug, Deserialize)]
struct LatestTradeResponse {
    trade: Option<Trade>,
}

#[derive(Debug, Deserialize)]
struct Trade {
    #[serde(rename = "p")]
    price: f64,
}

#[derive(Debug, Deserialize)]
struct LatestQuotesResponse {
    #[serde(default)]
    quotes: HashMap<String, OptionQuote>,
}

#[derive(Debug, Deserialize)]
struct OptionQuote {
    #[serde(rename = "ap")]
    ask_price: Option<f64>,
}

fn parse_latest_trade(underlying: &str, body: &str) -> Result<f64> {
    let response: LatestTradeResponse =
        serde_json::from_str(body).map_err(|e| ScanError::transient(underlying, e))?;

    match response.trade {
        Some(trade) if trade.price.is_finite() && trade.price > 0.0 => Ok(trade.price),
        _ => Err(ScanError::unavailable(underlying)),
    }
}

fn parse_latest_ask(symbol: &str, body: &str) -> Result<f64> {
    let response: LatestQuotesResponse =
        serde_json::from_str(body).map_err(|e| ScanError::transient(symbol, e))?;

    match response.quotes.get(symbol).and_then(|q| q.ask_price) {
        Some(ask) if ask.is_finite() && ask >= 0.0 => Ok(ask),
        _ => Err(ScanError::unavailable(symbol)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYMBOL: &str = "QQQ240119C00400000";

    #[test]
    fn reads_ask_for_requested_symbol() {
        let body = r#"{"quotes":{"QQQ240119C00400000":{"ap":5.25,"as":10,"bp":5.1,"bs":4,"t":"2024-01-02T15:00:00Z"}}}"#;
        assert_eq!(parse_latest_ask(SYMBOL, body).unwrap(), 5.25);
    }

    #[test]
    fn missing_quote_is_unavailable() {
        for body in [
            r#"{"quotes":{}}"#,
            r#"{}"#,
            r#"{"quotes":{"QQQ240119P00400000":{"ap":1.0}}}"#,
            r#"{"quotes":{"QQQ240119C00400000":{"bp":1.0}}}"#,
            r#"{"quotes":{"QQQ240119C00400000":{"ap":-1.0}}}"#,
        ] {
            assert!(
                matches!(parse_latest_ask(SYMBOL, body), Err(ScanError::QuoteUnavailable { .. })),
                "accepted {body}"
            );
        }
    }

    #[test]
    fn garbage_body_is_transient() {
        assert!(matches!(
            parse_latest_ask(SYMBOL, "<html>bad gateway</html>"),
            Err(ScanError::TransientFetch { .. })
        ));
    }

    #[test]
    fn reads_latest_trade_price() {
        let body = r#"{"symbol":"QQQ","trade":{"t":"2024-01-02T15:00:00Z","x":"V","p":402.17,"s":100}}"#;
        assert_eq!(parse_latest_trade("QQQ", body).unwrap(), 402.17);
        assert!(matches!(
            parse_latest_trade("QQQ", r#"{"symbol":"QQQ","trade":null}"#),
            Err(ScanError::QuoteUnavailable { .. })
        ));
    }

    #[tokio::test]
    #[ignore] // Requires network and ALPACA_API_KEY / ALPACA_API_SECRET
    async fn test_latest_trade() {
        let credentials = Credentials {
            api_key: std::env::var("ALPACA_API_KEY").unwrap(),
            api_secret: std::env::var("ALPACA_API_SECRET").unwrap(),
        };
        let client = AlpacaClient::new(DEFAULT_DATA_URL, DEFAULT_FEED, credentials);
        let price = client.latest_trade("QQQ").await.unwrap();
        assert!(price > 0.0);
    }
}
