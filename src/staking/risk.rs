use crate::types::RiskProfile;

/// Bound a raw stake recommendation by the profile's bankroll cap.
///
/// Returns `min(raw_stake, bankroll * max_stake_percentage)`, floored at
/// zero. Pure function; the invariant
/// `risk_adjusted_stake <= bankroll * max_stake_percentage` always holds.
pub fn clamp_stake(raw_stake: f64, bankroll: f64, profile: &RiskProfile) -> f64 {
    if !raw_stake.is_finite() || !bankroll.is_finite() {
        return 0.0;
    }
    let cap = bankroll.max(0.0) * profile.max_stake_percentage.clamp(0.0, 1.0);
    raw_stake.clamp(0.0, cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskProfileKind;

    fn moderate() -> RiskProfile {
        RiskProfile::for_kind(RiskProfileKind::Moderate)
    }

    #[test]
    fn clamps_to_bankroll_cap() {
        // moderate = 5% of 1000 = 50
        assert_eq!(clamp_stake(100.0, 1000.0, &moderate()), 50.0);
    }

    #[test]
    fn passes_through_stakes_under_the_cap() {
        assert_eq!(clamp_stake(30.0, 1000.0, &moderate()), 30.0);
    }

    #[test]
    fn negative_and_non_finite_inputs_floor_at_zero() {
        assert_eq!(clamp_stake(-10.0, 1000.0, &moderate()), 0.0);
        assert_eq!(clamp_stake(f64::NAN, 1000.0, &moderate()), 0.0);
        assert_eq!(clamp_stake(50.0, -100.0, &moderate()), 0.0);
    }

    #[test]
    fn invariant_holds_across_profiles() {
        for kind in [
            RiskProfileKind::Conservative,
            RiskProfileKind::Moderate,
            RiskProfileKind::Aggressive,
        ] {
            let profile = RiskProfile::for_kind(kind);
            for bankroll in [0.0, 85.0, 1000.0, 50_000.0] {
                let clamped = clamp_stake(10_000.0, bankroll, &profile);
                assert!(clamped <= bankroll * profile.max_stake_percentage + 1e-9);
            }
        }
    }
}
