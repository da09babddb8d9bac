/// Intermediate values of a Kelly sizing pass, kept for display and logging.
#[derive(Debug, Clone, Copy)]
pub struct StakeQuote {
    pub p: f64,
    pub b: f64,
    pub f_raw: f64,
    pub f_scaled: f64,
    pub stake: f64,
}

impl StakeQuote {
    fn no_bet() -> Self {
        Self {
            p: 0.0,
            b: 0.0,
            f_raw: 0.0,
            f_scaled: 0.0,
            stake: 0.0,
        }
    }
}

/// Fractional-Kelly stake from decimal odds and win probability.
///
/// `f* = (b*p - q) / b` with `b = odds - 1`, scaled by `multiplier`
/// (0.5 = half-Kelly). Unusable inputs (odds <= 1, non-finite values)
/// produce a zero stake instead of an error; the probability is clamped
/// into [0, 1] before computing. Negative Kelly clamps to zero.
pub fn compute_kelly_stake(odds: f64, probability: f64, bankroll: f64, multiplier: f64) -> StakeQuote {
    if !odds.is_finite() || !probability.is_finite() || !bankroll.is_finite() {
        return StakeQuote::no_bet();
    }

    let b = odds - 1.0;
    if b <= 0.0 {
        return StakeQuote::no_bet();
    }

    let p = probability.clamp(0.0, 1.0);
    let f_raw = ((b * p) - (1.0 - p)) / b;
    let f_scaled = (f_raw * multiplier.max(0.0)).max(0.0);
    let stake = (f_scaled * bankroll.max(0.0)).max(0.0);

    StakeQuote {
        p,
        b,
        f_raw,
        f_scaled,
        stake,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_kelly_worked_example() {
        // odds 2.0, p 0.6: f* = (1*0.6 - 0.4) / 1 = 0.2, half-Kelly 0.1
        let q = compute_kelly_stake(2.0, 0.6, 1000.0, 0.5);
        assert!((q.f_raw - 0.2).abs() < 1e-9);
        assert!((q.stake - 100.0).abs() < 1e-9);
    }

    #[test]
    fn stake_zero_when_negative_edge() {
        let q = compute_kelly_stake(2.0, 0.45, 1000.0, 0.5);
        assert!(q.f_raw < 0.0);
        assert_eq!(q.stake, 0.0);
    }

    #[test]
    fn stake_zero_when_odds_at_or_below_one() {
        assert_eq!(compute_kelly_stake(1.0, 0.9, 1000.0, 0.5).stake, 0.0);
        assert_eq!(compute_kelly_stake(0.5, 0.9, 1000.0, 0.5).stake, 0.0);
    }

    #[test]
    fn probability_is_clamped_before_computing() {
        let q = compute_kelly_stake(2.0, 1.7, 1000.0, 0.5);
        assert_eq!(q.p, 1.0);
        // p = 1 on even odds is full conviction: f* = 1, half-Kelly 0.5
        assert!((q.stake - 500.0).abs() < 1e-9);

        let q = compute_kelly_stake(2.0, -0.3, 1000.0, 0.5);
        assert_eq!(q.p, 0.0);
        assert_eq!(q.stake, 0.0);
    }

    #[test]
    fn non_finite_inputs_produce_no_bet() {
        assert_eq!(compute_kelly_stake(f64::NAN, 0.6, 1000.0, 0.5).stake, 0.0);
        assert_eq!(compute_kelly_stake(2.0, f64::INFINITY, 1000.0, 0.5).stake, 0.0);
        assert_eq!(compute_kelly_stake(2.0, 0.6, f64::NAN, 0.5).stake, 0.0);
    }

    #[test]
    fn stake_never_negative_across_probability_grid() {
        for i in 0..=100 {
            let p = i as f64 / 100.0;
            let q = compute_kelly_stake(1.8, p, 500.0, 0.5);
            assert!(q.stake >= 0.0, "negative stake at p={}", p);
        }
    }
}
