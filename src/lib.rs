//! Put-call parity scanner for conversion/reversal mispricings on a single
//! underlying.

pub mod client;
pub mod config;
pub mod error;
pub mod expiration;
pub mod generator;
pub mod models;
pub mod provider;
pub mod scanner;
pub mod symbol;
pub mod valuator;
pub mod yahoo;

pub use client::{AlpacaClient, Credentials};
pub use config::{Config, ExpirationPolicy};
pub use error::{Result, ScanError};
pub use models::{OptionChain, OptionPair, ScanReport, SpreadEvaluation, StrikeRecord};
pub use provider::{MarketData, QuoteSource};
pub use scanner::SpreadScanner;
pub use symbol::{OptionIdentifier, OptionType};
pub use yahoo::YahooClient;
