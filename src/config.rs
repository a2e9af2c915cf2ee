//! Scanner configuration.
//!
//! Loaded from an optional TOML file; every field has a default. Credentials
//! are never read from the file, the binary pulls them from the environment.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing_subscriber::{fmt, EnvFilter};

use crate::client;
use crate::error::{Result, ScanError};
use crate::expiration::days_to_expiration;
use crate::symbol;
use crate::yahoo;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Underlying to scan, 3 or 4 characters
    pub underlying: String,
    /// Annual, continuously compounded
    pub risk_free_rate: f64,
    pub expiration: ExpirationPolicy,
    /// Strike band half-width as a fraction of spot
    pub band_width: f64,
    pub max_concurrent_requests: usize,
    pub alpaca: AlpacaConfig,
    pub yahoo: YahooConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            underlying: "QQQ".to_string(),
            risk_free_rate: 0.054465,
            expiration: ExpirationPolicy::default(),
            band_width: 0.05,
            max_concurrent_requests: 20,
            alpaca: AlpacaConfig::default(),
            yahoo: YahooConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScanError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| ScanError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        symbol::check_underlying(&self.underlying).map_err(|e| ScanError::Config(e.to_string()))?;
        if !self.risk_free_rate.is_finite() {
            return Err(ScanError::Config("risk_free_rate must be finite".into()));
        }
        if !(self.band_width > 0.0 && self.band_width < 1.0) {
            return Err(ScanError::Config(format!(
                "band_width {} must be between 0 and 1",
                self.band_width
            )));
        }
        if self.max_concurrent_requests == 0 || self.max_concurrent_requests > Semaphore::MAX_PERMITS {
            return Err(ScanError::Config(format!(
                "max_concurrent_requests must be between 1 and {}",
                Semaphore::MAX_PERMITS
            )));
        }
        Ok(())
    }
}

/// How the scanned expiration is picked from the listed ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationPolicy {
    /// n-th listed expiration, 0 is the nearest
    Index(usize),
    /// First expiration at least this many days out
    MinDays(i64),
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        ExpirationPolicy::Index(2)
    }
}

impl ExpirationPolicy {
    /// Picks from expirations listed ascending
    pub fn select(&self, expirations: &[NaiveDate], today: NaiveDate) -> Option<NaiveDate> {
        match *self {
            ExpirationPolicy::Index(n) => expirations.get(n).copied(),
            ExpirationPolicy::MinDays(days) => expirations
                .iter()
                .copied()
                .find(|&e| days_to_expiration(e, today) >= days),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlpacaConfig {
    pub data_url: String,
    pub feed: String,
}

impl Default for AlpacaConfig {
    fn default() -> Self {
        Self {
            data_url: client::DEFAULT_DATA_URL.to_string(),
            feed: client::DEFAULT_FEED.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct YahooConfig {
    pub base_url: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: yahoo::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Installs the global tracing subscriber; `RUST_LOG` wins over `level`
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).with_writer(std::io::stderr).init();
            }
            _ => {
                fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.underlying, "QQQ");
        assert_eq!(config.risk_free_rate, 0.054465);
        assert_eq!(config.expiration, ExpirationPolicy::Index(2));
        assert_eq!(config.band_width, 0.05);
        assert_eq!(config.alpaca.feed, "indicative");
    }

    #[test]
    fn parses_overrides() {
        let config = Config::parse(
            r#"
            underlying = "AAPL"
            risk_free_rate = 0.04
            expiration = { min_days = 30 }
            max_concurrent_requests = 4

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.underlying, "AAPL");
        assert_eq!(config.expiration, ExpirationPolicy::MinDays(30));
        assert_eq!(config.max_concurrent_requests, 4);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn rejects_invalid_values() {
        for content in [
            r#"underlying = "GOOGL""#,
            r#"underlying = "qqq""#,
            r#"underlying = "Q-Q""#,
            "max_concurrent_requests = 9223372036854775807",
            "band_width = 1.5",
            "max_concurrent_requests = 0",
            "risk_free_rate = nan",
            "band_width = \"wide\"",
        ] {
            assert!(
                matches!(Config::parse(content), Err(ScanError::Config(_))),
                "accepted {content}"
            );
        }
    }

    #[test]
    fn selects_expiration_by_policy() {
        let today = date(2024, 1, 2);
        let listed = [date(2024, 1, 5), date(2024, 1, 12), date(2024, 1, 19), date(2024, 2, 16)];

        assert_eq!(ExpirationPolicy::Index(2).select(&listed, today), Some(date(2024, 1, 19)));
        assert_eq!(ExpirationPolicy::Index(9).select(&listed, today), None);
        assert_eq!(ExpirationPolicy::MinDays(15).select(&listed, today), Some(date(2024, 1, 19)));
        assert_eq!(ExpirationPolicy::MinDays(90).select(&listed, today), None);
    }
}
