//! Interfaces the scanner needs from the outside world.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::OptionChain;
use crate::symbol::OptionIdentifier;

/// Expirations and option chains for an underlying
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Listed expirations, ascending
    async fn expirations(&self, underlying: &str) -> Result<Vec<NaiveDate>>;

    async fn option_chain(&self, underlying: &str, expiration: NaiveDate) -> Result<OptionChain>;
}

/// Latest prices for underlyings and option contracts
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Last traded price of the underlying
    async fn latest_trade(&self, underlying: &str) -> Result<f64>;

    /// Latest ask of an option contract.
    ///
    /// Fails with `QuoteUnavailable` when the provider has nothing for the
    /// symbol and `TransientFetch` on network or HTTP errors. No retries.
    async fn latest_ask(&self, option: &OptionIdentifier) -> Result<f64>;
}
