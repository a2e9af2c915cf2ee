use thiserror::Error;

/// Errors raised while building and running a spread scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot encode option symbol: {0}")]
    Encoding(String),

    #[error("cannot decode option symbol '{token}': {reason}")]
    Decoding { token: String, reason: String },

    #[error("malformed date '{input}': expected {expected}")]
    DateFormat { input: String, expected: &'static str },

    #[error("no quote available for {symbol}")]
    QuoteUnavailable { symbol: String },

    #[error("fetch failed for {symbol}: {reason}")]
    TransientFetch { symbol: String, reason: String },

    #[error("no expiration selected for {underlying}: {reason}")]
    NoExpiration { underlying: String, reason: String },

    #[error("invalid reference price {0}")]
    InvalidPrice(f64),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;

impl ScanError {
    pub fn decoding(token: &str, reason: impl Into<String>) -> Self {
        Self::Decoding {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    pub fn transient(symbol: &str, reason: impl ToString) -> Self {
        Self::TransientFetch {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn unavailable(symbol: &str) -> Self {
        Self::QuoteUnavailable {
            symbol: symbol.to_string(),
        }
    }

    /// Whether the failure only affects the pair being evaluated.
    /// Everything else is a setup problem and aborts the scan.
    pub fn is_pair_local(&self) -> bool {
        matches!(
            self,
            ScanError::QuoteUnavailable { .. } | ScanError::TransientFetch { .. }
        )
    }
}
