//! Fixed-width option symbols.
//!
//! A symbol is `UNDERLYING + YYMMDD + C|P + strike in thousandths (8 digits)`,
//! e.g. `QQQ240119C00400000` or `AAPL240119P00187500`. Only 3 and 4 character
//! underlyings are supported: the type character then sits at offset 9 or 10,
//! and since offset 9 is a date digit for 4 character underlyings the two
//! layouts never collide.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::expiration;

const DATE_LEN: usize = 6;
const STRIKE_LEN: usize = 8;
const MAX_STRIKE_THOUSANDTHS: u64 = 99_999_999;

/// Call or put
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn as_char(self) -> char {
        match self {
            OptionType::Call => 'C',
            OptionType::Put => 'P',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'C' => Some(OptionType::Call),
            'P' => Some(OptionType::Put),
            _ => None,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// One option contract, identified by underlying, expiration, type and strike
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionIdentifier {
    underlying: String,
    expiration: NaiveDate,
    option_type: OptionType,
    strike_thousandths: u64,
}

impl OptionIdentifier {
    /// Validates the fields so that the identifier can always be encoded
    pub fn new(
        underlying: &str,
        expiration: NaiveDate,
        option_type: OptionType,
        strike: f64,
    ) -> Result<Self> {
        check_underlying(underlying)?;
        // Fails for years outside the 20xx window
        expiration::format_compact(expiration).map_err(|e| ScanError::Encoding(e.to_string()))?;
        let strike_thousandths = strike_to_thousandths(strike)?;

        Ok(Self {
            underlying: underlying.to_string(),
            expiration,
            option_type,
            strike_thousandths,
        })
    }

    pub fn underlying(&self) -> &str {
        &self.underlying
    }

    pub fn expiration(&self) -> NaiveDate {
        self.expiration
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn strike(&self) -> f64 {
        self.strike_thousandths as f64 / 1000.0
    }

    pub fn strike_thousandths(&self) -> u64 {
        self.strike_thousandths
    }

    /// Same contract with the other side swapped in (call <-> put)
    pub fn with_type(&self, option_type: OptionType) -> Self {
        Self {
            option_type,
            ..self.clone()
        }
    }

    pub fn token(&self) -> String {
        self.to_string()
    }

    /// Human readable breakdown of the symbol
    pub fn describe(&self) -> String {
        format!(
            "Option Symbol: {}\nUnderlying: {}\nExpiration: {}\nType: {}\nStrike: {:.2}",
            self,
            self.underlying,
            expiration::format_expanded(self.expiration),
            self.option_type,
            self.strike()
        )
    }
}

impl fmt::Display for OptionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{:0width$}",
            self.underlying,
            self.expiration.format("%y%m%d"),
            self.option_type.as_char(),
            self.strike_thousandths,
            width = STRIKE_LEN
        )
    }
}

impl FromStr for OptionIdentifier {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        decode(s)
    }
}

/// Encodes the contract fields into a fixed-width symbol
pub fn encode(
    underlying: &str,
    expiration: NaiveDate,
    option_type: OptionType,
    strike: f64,
) -> Result<String> {
    Ok(OptionIdentifier::new(underlying, expiration, option_type, strike)?.token())
}

/// Decodes a fixed-width symbol.
///
/// The underlying length is inferred from where the type character sits:
/// offset 9 means a 3 character underlying, offset 10 a 4 character one.
pub fn decode(token: &str) -> Result<OptionIdentifier> {
    if !token.is_ascii() {
        return Err(ScanError::decoding(token, "symbol must be ASCII"));
    }

    let bytes = token.as_bytes();
    let type_at = |offset: usize| {
        bytes
            .get(offset)
            .and_then(|&b| OptionType::from_char(b as char))
    };

    let (underlying_len, option_type) = match (type_at(3 + DATE_LEN), type_at(4 + DATE_LEN)) {
        (Some(t), _) => (3, t),
        (None, Some(t)) => (4, t),
        (None, None) => {
            return Err(ScanError::decoding(
                token,
                "no type character at offset 9 or 10",
            ))
        }
    };

    let expected_len = underlying_len + DATE_LEN + 1 + STRIKE_LEN;
    if token.len() != expected_len {
        return Err(ScanError::decoding(
            token,
            format!(
                "expected {} characters for a {}-character underlying, got {}",
                expected_len,
                underlying_len,
                token.len()
            ),
        ));
    }

    let underlying = &token[..underlying_len];
    check_underlying(underlying).map_err(|e| ScanError::decoding(token, e.to_string()))?;

    let date_start = underlying_len;
    let date_end = date_start + DATE_LEN;
    let expiration = expiration::parse_compact(&token[date_start..date_end])
        .map_err(|e| ScanError::decoding(token, e.to_string()))?;

    let strike_digits = &token[date_end + 1..];
    if !strike_digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ScanError::decoding(token, "strike must be 8 digits"));
    }
    let strike_thousandths: u64 = strike_digits
        .parse()
        .map_err(|_| ScanError::decoding(token, "strike must be 8 digits"))?;

    Ok(OptionIdentifier {
        underlying: underlying.to_string(),
        expiration,
        option_type,
        strike_thousandths,
    })
}

/// Underlyings are 3 or 4 uppercase ASCII letters or digits
pub fn check_underlying(underlying: &str) -> Result<()> {
    if !(3..=4).contains(&underlying.len()) {
        return Err(ScanError::Encoding(format!(
            "underlying '{}' must be 3 or 4 characters",
            underlying
        )));
    }
    if !underlying
        .bytes()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    {
        return Err(ScanError::Encoding(format!(
            "underlying '{}' must be uppercase alphanumeric",
            underlying
        )));
    }
    Ok(())
}

fn strike_to_thousandths(strike: f64) -> Result<u64> {
    if !strike.is_finite() || strike < 0.0 {
        return Err(ScanError::Encoding(format!(
            "strike {} must be a non-negative number",
            strike
        )));
    }

    let scaled = strike * 1000.0;
    let rounded = scaled.round();
    if (scaled - rounded).abs() > 1e-6 {
        return Err(ScanError::Encoding(format!(
            "strike {} has more than 3 decimal places",
            strike
        )));
    }
    if rounded > MAX_STRIKE_THOUSANDTHS as f64 {
        return Err(ScanError::Encoding(format!(
            "strike {} does not fit in {} digits",
            strike, STRIKE_LEN
        )));
    }

    Ok(rounded as u64)
}
