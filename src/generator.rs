use chrono::NaiveDate;
use tracing::debug;

use crate::error::{Result, ScanError};
use crate::models::{OptionChain, StrikeRecord};
use crate::symbol::{self, OptionType};

/// Inclusive strike range around a reference price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBand {
    pub lower: f64,
    pub upper: f64,
}

impl PriceBand {
    /// `width` is a fraction of the reference price (0.05 keeps strikes within ±5%)
    pub fn around(reference_price: f64, width: f64) -> Result<Self> {
        if !reference_price.is_finite() || reference_price <= 0.0 {
            return Err(ScanError::InvalidPrice(reference_price));
        }
        Ok(Self {
            lower: reference_price * (1.0 - width),
            upper: reference_price * (1.0 + width),
        })
    }

    pub fn contains(&self, strike: f64) -> bool {
        self.lower <= strike && strike <= self.upper
    }
}

/// Symbols of the calls and puts that fell inside the band, ascending by strike
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSymbols {
    pub calls: Vec<String>,
    pub puts: Vec<String>,
}

/// Builds the call and put symbols whose strikes lie within `band`
pub fn generate_option_symbols(
    underlying: &str,
    expiration: NaiveDate,
    band: PriceBand,
    chain: &OptionChain,
) -> Result<CandidateSymbols> {
    let calls = symbols_in_band(underlying, expiration, OptionType::Call, band, &chain.calls)?;
    let puts = symbols_in_band(underlying, expiration, OptionType::Put, band, &chain.puts)?;

    debug!(
        underlying,
        lower = band.lower,
        upper = band.upper,
        calls = calls.len(),
        puts = puts.len(),
        "Generated candidate symbols"
    );

    Ok(CandidateSymbols { calls, puts })
}

fn symbols_in_band(
    underlying: &str,
    expiration: NaiveDate,
    option_type: OptionType,
    band: PriceBand,
    records: &[StrikeRecord],
) -> Result<Vec<String>> {
    // Providers list strikes ascending; sort anyway so the early break below stays sound
    let mut strikes: Vec<f64> = records.iter().map(|r| r.strike).collect();
    strikes.sort_by(|a, b| a.total_cmp(b));

    let mut symbols = Vec::new();
    for strike in strikes {
        if strike > band.upper {
            break;
        }
        if band.contains(strike) {
            symbols.push(symbol::encode(underlying, expiration, option_type, strike)?);
        }
    }

    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(strikes: &[f64]) -> OptionChain {
        OptionChain {
            calls: strikes.iter().copied().map(StrikeRecord::at).collect(),
            puts: strikes.iter().copied().map(StrikeRecord::at).collect(),
        }
    }

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 19).unwrap()
    }

    #[test]
    fn keeps_strikes_within_five_percent_inclusive() {
        let band = PriceBand::around(100.0, 0.05).unwrap();
        let chain = chain(&[90.0, 94.0, 95.0, 100.0, 105.0, 106.0, 110.0]);

        let symbols = generate_option_symbols("QQQ", expiry(), band, &chain).unwrap();

        assert_eq!(
            symbols.calls,
            vec!["QQQ240119C00095000", "QQQ240119C00100000", "QQQ240119C00105000"]
        );
        assert_eq!(
            symbols.puts,
            vec!["QQQ240119P00095000", "QQQ240119P00100000", "QQQ240119P00105000"]
        );
    }

    #[test]
    fn unsorted_provider_output_is_not_truncated() {
        let band = PriceBand::around(100.0, 0.05).unwrap();
        let chain = chain(&[110.0, 100.0, 90.0, 96.5, 104.0]);

        let symbols = generate_option_symbols("AAPL", expiry(), band, &chain).unwrap();

        assert_eq!(
            symbols.calls,
            vec!["AAPL240119C00096500", "AAPL240119C00100000", "AAPL240119C00104000"]
        );
    }

    #[test]
    fn calls_and_puts_are_filtered_independently() {
        let band = PriceBand::around(200.0, 0.05).unwrap();
        let chain = OptionChain {
            calls: vec![StrikeRecord::at(195.0), StrikeRecord::at(200.0)],
            puts: vec![StrikeRecord::at(200.0), StrikeRecord::at(205.0), StrikeRecord::at(215.0)],
        };

        let symbols = generate_option_symbols("SPY", expiry(), band, &chain).unwrap();

        assert_eq!(symbols.calls.len(), 2);
        assert_eq!(symbols.puts, vec!["SPY240119P00200000", "SPY240119P00205000"]);
    }

    #[test]
    fn rejects_non_positive_reference_price() {
        assert!(matches!(PriceBand::around(0.0, 0.05), Err(ScanError::InvalidPrice(_))));
        assert!(PriceBand::around(f64::NAN, 0.05).is_err());
    }

    #[test]
    fn unencodable_strike_in_band_is_an_error() {
        let band = PriceBand::around(100.0, 0.05).unwrap();
        let chain = chain(&[100.0001]);
        assert!(matches!(
            generate_option_symbols("QQQ", expiry(), band, &chain),
            Err(ScanError::Encoding(_))
        ));
    }
}
