/// Display-ready payout summary for a stake at given odds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoutQuote {
    pub potential_payout: f64,
    pub expected_value: f64,
}

/// Combine stake, odds and win probability into a payout preview.
///
/// `potential_payout = stake * odds`,
/// `expected_value = stake * (odds * p - 1)`.
/// Deterministic, no I/O; unusable inputs yield a zero quote so a broken
/// recommendation never reaches the slip as NaN.
pub fn compose_payout(stake: f64, odds: f64, probability: f64) -> PayoutQuote {
    if !stake.is_finite() || !odds.is_finite() || !probability.is_finite() {
        return PayoutQuote {
            potential_payout: 0.0,
            expected_value: 0.0,
        };
    }

    let stake = stake.max(0.0);
    let p = probability.clamp(0.0, 1.0);

    PayoutQuote {
        potential_payout: stake * odds,
        expected_value: stake * (odds * p - 1.0),
    }
}
