//! Stake sizing pipeline: Kelly recommendation, risk clamp, payout preview.
//!
//! A selection or bankroll change runs kelly -> clamp -> payout and lands
//! the result in the preview book, keyed by event.

pub mod kelly;
pub mod payout;
pub mod preview_book;
pub mod risk;

pub use kelly::{compute_kelly_stake, StakeQuote};
pub use payout::{compose_payout, PayoutQuote};
pub use preview_book::PreviewBook;
pub use risk::clamp_stake;

use crate::types::{BetSelection, PayoutData, RiskProfile};

/// Tunables for the sizing pipeline, sourced from configuration.
#[derive(Debug, Clone, Copy)]
pub struct StakingParams {
    /// Fraction of full Kelly to apply (0.5 = half-Kelly)
    pub kelly_multiplier: f64,
    /// Stakes below this round down to zero ("no bet")
    pub min_stake: f64,
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            kelly_multiplier: 0.5,
            min_stake: 0.0,
        }
    }
}

/// Run the full sizing pipeline for one selection.
///
/// A user-entered stake overrides the Kelly recommendation but still goes
/// through the risk clamp, so `risk_adjusted_stake` never exceeds
/// `bankroll * max_stake_percentage`.
pub fn build_payout_data(
    selection: &BetSelection,
    bankroll: f64,
    profile: &RiskProfile,
    params: &StakingParams,
) -> PayoutData {
    let quote = compute_kelly_stake(
        selection.odds,
        selection.probability,
        bankroll,
        params.kelly_multiplier,
    );

    let requested = match selection.stake {
        Some(stake) if stake.is_finite() && stake > 0.0 => stake,
        Some(_) => 0.0,
        None => quote.stake,
    };

    let mut risk_adjusted = clamp_stake(requested, bankroll, profile);
    if risk_adjusted < params.min_stake {
        risk_adjusted = 0.0;
    }

    let preview = compose_payout(risk_adjusted, selection.odds, selection.probability);

    PayoutData {
        kelly_stake: quote.stake,
        risk_adjusted_stake: risk_adjusted,
        potential_payout: preview.potential_payout,
        expected_value: preview.expected_value,
    }
}
