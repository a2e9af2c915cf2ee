use chrono::NaiveDate;
use serde::Deserialize;

use crate::symbol::OptionIdentifier;

/// One strike row of an option chain as returned by the market-data provider
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrikeRecord {
    pub strike: f64,
    #[serde(default)]
    pub contract_symbol: Option<String>,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default)]
    pub last_price: Option<f64>,
}

impl StrikeRecord {
    pub fn at(strike: f64) -> Self {
        Self {
            strike,
            contract_symbol: None,
            bid: None,
            ask: None,
            last_price: None,
        }
    }
}

/// Calls and puts listed for a single expiration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionChain {
    pub calls: Vec<StrikeRecord>,
    pub puts: Vec<StrikeRecord>,
}

/// A call and a put sharing underlying, expiration and strike
#[derive(Debug, Clone, PartialEq)]
pub struct OptionPair {
    pub call: OptionIdentifier,
    pub put: OptionIdentifier,
}

impl OptionPair {
    pub fn strike(&self) -> f64 {
        self.call.strike()
    }
}

/// Read-only inputs shared by every pair valuation in a scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanContext {
    /// Underlying spot price
    pub price: f64,
    pub risk_free_rate: f64,
    pub days_to_expiration: i64,
}

/// Put-call parity valuation of one matched pair
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadEvaluation {
    pub call_symbol: String,
    pub put_symbol: String,
    pub price: f64,
    pub strike: f64,
    pub risk_free_rate: f64,
    pub days_to_expiration: i64,
    pub call_ask: f64,
    pub put_ask: f64,
    pub call_put_difference: f64,
    pub strike_present_value: f64,
    /// Spot minus the strike's present value
    pub strike_difference: f64,
    pub profit: f64,
}

impl SpreadEvaluation {
    /// Prints this spread in a formatted way
    pub fn print(&self, index: usize) {
        println!("\n{}. {} / {}", index, self.call_symbol, self.put_symbol);
        println!("   Call Ask: {:.4}", self.call_ask);
        println!("   Put Ask: {:.4}", self.put_ask);
        println!("   Call, Put Difference: {:.4}", self.call_put_difference);
        println!("   Strike: {:.3}", self.strike);
        println!("   Price, Strike Difference: {:.4}", self.strike_difference);
        println!("   Price: {:.4}", self.price);
        println!("   Profit: {:.2}", self.profit);
        println!("{}", "-".repeat(80));
    }
}

/// A pair that could not be evaluated
#[derive(Debug, Clone, PartialEq)]
pub struct PairFailure {
    pub call_symbol: String,
    pub put_symbol: String,
    pub reason: String,
}

/// Outcome of a single scan
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub underlying: String,
    pub expiration: NaiveDate,
    pub price: f64,
    pub days_to_expiration: i64,
    /// Sorted ascending by profit
    pub evaluations: Vec<SpreadEvaluation>,
    pub failures: Vec<PairFailure>,
}

impl ScanReport {
    pub fn print(&self) {
        println!(
            "{} @ {:.2} | expiration {} ({} days)",
            self.underlying, self.price, self.expiration, self.days_to_expiration
        );
        println!("{}", "=".repeat(80));

        if self.evaluations.is_empty() {
            println!("No call/put pairs could be evaluated.");
        }
        for (i, evaluation) in self.evaluations.iter().enumerate() {
            evaluation.print(i + 1);
        }

        if !self.failures.is_empty() {
            println!("\n{} pair(s) skipped:", self.failures.len());
            for failure in &self.failures {
                println!(
                    "   • {} / {}: {}",
                    failure.call_symbol, failure.put_symbol, failure.reason
                );
            }
        }
    }
}
