//! Put-call parity valuation of a matched call/put pair.

use crate::models::{OptionPair, ScanContext, SpreadEvaluation};

/// Shares per standard equity option contract
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Strike discounted continuously at `rate` over `days` calendar days
pub fn present_value_of_strike(strike: f64, rate: f64, days: i64) -> f64 {
    strike * (-rate * (days as f64 / 365.0)).exp()
}

/// Profit estimate per contract of the synthetic position implied by the asks.
///
/// When the spot's premium over the discounted strike is smaller than the
/// call/put premium difference the synthetic long is rich, otherwise the
/// synthetic short is. No costs are modelled.
pub fn calculate_profit(call_ask: f64, put_ask: f64, strike: f64, context: &ScanContext) -> f64 {
    let strike_pv =
        present_value_of_strike(strike, context.risk_free_rate, context.days_to_expiration);
    let strike_difference = context.price - strike_pv;
    let call_put_difference = call_ask - put_ask;

    if strike_difference < call_put_difference {
        (strike + (call_ask - put_ask) - context.price) * CONTRACT_MULTIPLIER
    } else {
        (context.price + (put_ask - call_ask) - strike) * CONTRACT_MULTIPLIER
    }
}

/// Values one pair from its quoted asks
pub fn evaluate(
    pair: &OptionPair,
    call_ask: f64,
    put_ask: f64,
    context: &ScanContext,
) -> SpreadEvaluation {
    let strike = pair.strike();
    let strike_present_value =
        present_value_of_strike(strike, context.risk_free_rate, context.days_to_expiration);

    SpreadEvaluation {
        call_symbol: pair.call.token(),
        put_symbol: pair.put.token(),
        price: context.price,
        strike,
        risk_free_rate: context.risk_free_rate,
        days_to_expiration: context.days_to_expiration,
        call_ask,
        put_ask,
        call_put_difference: call_ask - put_ask,
        strike_present_value,
        strike_difference: context.price - strike_present_value,
        profit: calculate_profit(call_ask, put_ask, strike, context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{decode, OptionType};

    fn context(price: f64) -> ScanContext {
        ScanContext {
            price,
            risk_free_rate: 0.05,
            days_to_expiration: 30,
        }
    }

    fn pair(token: &str) -> OptionPair {
        let call = decode(token).unwrap();
        let put = call.with_type(OptionType::Put);
        OptionPair { call, put }
    }

    #[test]
    fn synthetic_long_branch() {
        let evaluation = evaluate(&pair("QQQ240119C00100000"), 5.0, 3.0, &context(101.0));

        assert!((evaluation.strike_present_value - 99.5899).abs() < 1e-3);
        assert!((evaluation.strike_difference - 1.4101).abs() < 1e-3);
        assert_eq!(evaluation.call_put_difference, 2.0);
        assert!((evaluation.profit - 100.0).abs() < 1e-9);
        assert_eq!(evaluation.put_symbol, "QQQ240119P00100000");
    }

    #[test]
    fn synthetic_short_branch() {
        // strike_difference ≈ 1.41 >= call_put_difference = 1.0
        let profit = calculate_profit(4.0, 3.0, 100.0, &context(101.0));
        assert!((profit - (101.0 + (3.0 - 4.0) - 100.0) * 100.0).abs() < 1e-9);
        assert!(profit.abs() < 1e-9);
    }

    #[test]
    fn branch_follows_premium_comparison() {
        let profit = calculate_profit(4.4, 3.0, 100.0, &context(101.0));
        assert!((profit + 40.0).abs() < 1e-6);

        let profit = calculate_profit(1.0, 6.0, 100.0, &context(101.0));
        assert!((profit - 600.0).abs() < 1e-9);

        let profit = calculate_profit(9.0, 1.0, 100.0, &context(101.0));
        assert!((profit - 700.0).abs() < 1e-9);

        let profit = calculate_profit(2.5, 1.0, 100.0, &context(99.0));
        assert!((profit - 250.0).abs() < 1e-9);
    }

    #[test]
    fn discounting_is_identity_at_zero_rate() {
        assert_eq!(present_value_of_strike(100.0, 0.0, 45), 100.0);
        assert!(present_value_of_strike(100.0, 0.05, 365) < 100.0);
    }
}
