//! Core types used throughout WagerDesk
//!
//! Defines common data structures for selections, payouts, risk profiles
//! and confidence bands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk appetite presets selectable from the settings panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfileKind {
    Conservative,
    Moderate,
    Aggressive,
}

impl Default for RiskProfileKind {
    fn default() -> Self {
        RiskProfileKind::Moderate
    }
}

impl RiskProfileKind {
    /// Default cap on a single stake as a fraction of bankroll
    pub fn default_max_stake_percentage(&self) -> f64 {
        match self {
            RiskProfileKind::Conservative => 0.02,
            RiskProfileKind::Moderate => 0.05,
            RiskProfileKind::Aggressive => 0.10,
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "conservative" => Some(RiskProfileKind::Conservative),
            "moderate" => Some(RiskProfileKind::Moderate),
            "aggressive" => Some(RiskProfileKind::Aggressive),
            _ => None,
        }
    }
}

impl fmt::Display for RiskProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskProfileKind::Conservative => write!(f, "conservative"),
            RiskProfileKind::Moderate => write!(f, "moderate"),
            RiskProfileKind::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// Process-wide risk settings read by the stake clamp
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Profile preset
    pub kind: RiskProfileKind,
    /// Cap on a single stake as a fraction of bankroll (0.0 - 1.0)
    pub max_stake_percentage: f64,
}

impl RiskProfile {
    /// Profile with the preset's default cap
    pub fn for_kind(kind: RiskProfileKind) -> Self {
        Self {
            kind,
            max_stake_percentage: kind.default_max_stake_percentage(),
        }
    }
}

impl Default for RiskProfile {
    fn default() -> Self {
        Self::for_kind(RiskProfileKind::default())
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (max {:.1}%)",
            self.kind,
            self.max_stake_percentage * 100.0
        )
    }
}

/// A bet the user has picked on the slip
///
/// Ephemeral: created on selection, overwritten on re-selection, discarded
/// on deselect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetSelection {
    /// Event identifier from the prediction backend
    pub event_id: String,
    /// Decimal odds (>= 1.0; 2.5 pays 2.5x the stake)
    pub odds: f64,
    /// Model win probability (0.0 - 1.0)
    pub probability: f64,
    /// User-entered stake override; None means "use the recommendation"
    pub stake: Option<f64>,
}

/// Derived payout preview for one selection
///
/// Keyed by event_id in the preview table; overwritten on every recompute,
/// never appended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoutData {
    /// Raw fractional-Kelly stake recommendation
    pub kelly_stake: f64,
    /// Stake after the risk-profile clamp
    pub risk_adjusted_stake: f64,
    /// Gross return if the bet wins (stake x odds)
    pub potential_payout: f64,
    /// Expected value of the stake (stake x (odds x p - 1))
    pub expected_value: f64,
}

impl PayoutData {
    /// Neutral preview used when inputs are unusable ("no bet")
    pub fn zero() -> Self {
        Self {
            kelly_stake: 0.0,
            risk_adjusted_stake: 0.0,
            potential_payout: 0.0,
            expected_value: 0.0,
        }
    }
}

/// Confidence interval around a predicted value
///
/// Read-only snapshot taken from the backend prediction payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    /// Lower bound of the interval
    pub lower: f64,
    /// Upper bound of the interval
    pub upper: f64,
    /// Predicted mean
    pub mean: f64,
    /// Stated confidence level (e.g. 0.95)
    pub confidence_level: f64,
}

/// Normalized prediction for one event
///
/// Produced at the ingest boundary from the backend's raw JSON; all fields
/// are validated and finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Event identifier
    pub event_id: String,
    /// Model win probability (0.0 - 1.0)
    pub win_probability: f64,
    /// Confidence band around the predicted value
    pub band: ConfidenceBand,
    /// Version tag of the model that produced this prediction
    pub model_version: String,
    /// When the backend generated it (Unix millis)
    pub generated_at: i64,
}

/// Outcome of a settled bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetResult {
    Won,
    Lost,
    Void,
}

impl BetResult {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "won" | "win" => Some(BetResult::Won),
            "lost" | "loss" => Some(BetResult::Lost),
            "void" | "push" => Some(BetResult::Void),
            _ => None,
        }
    }
}

impl fmt::Display for BetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetResult::Won => write!(f, "WON"),
            BetResult::Lost => write!(f, "LOST"),
            BetResult::Void => write!(f, "VOID"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_kind_round_trips_through_strings() {
        for kind in [
            RiskProfileKind::Conservative,
            RiskProfileKind::Moderate,
            RiskProfileKind::Aggressive,
        ] {
            assert_eq!(RiskProfileKind::from_str(&kind.to_string()), Some(kind));
        }
        assert_eq!(RiskProfileKind::from_str("yolo"), None);
    }

    #[test]
    fn profile_defaults_are_ordered_by_appetite() {
        let c = RiskProfileKind::Conservative.default_max_stake_percentage();
        let m = RiskProfileKind::Moderate.default_max_stake_percentage();
        let a = RiskProfileKind::Aggressive.default_max_stake_percentage();
        assert!(c < m && m < a);
    }
}
