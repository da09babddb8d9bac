//! Integration tests for the stake-sizing pipeline and prediction boundary

#[cfg(test)]
mod tests {
    use wagerdesk::bands::format_confidence_band;
    use wagerdesk::bankroll::BankrollStore;
    use wagerdesk::predictions::{
        normalize, NormalizeError, PredictionStore, RawConfidenceBand, RawPrediction,
    };
    use wagerdesk::staking::{
        build_payout_data, clamp_stake, compose_payout, compute_kelly_stake, PreviewBook,
        StakingParams,
    };
    use wagerdesk::types::{
        BetResult, BetSelection, ConfidenceBand, RiskProfile, RiskProfileKind,
    };

    fn selection(event_id: &str, odds: f64, probability: f64) -> BetSelection {
        BetSelection {
            event_id: event_id.to_string(),
            odds,
            probability,
            stake: None,
        }
    }

    // ============================================================================
    // Kelly stake properties
    // ============================================================================

    #[test]
    fn kelly_stake_is_never_negative() {
        for odds_bp in [101, 150, 200, 500, 2000] {
            let odds = odds_bp as f64 / 100.0;
            for p_pct in 0..=100 {
                let probability = p_pct as f64 / 100.0;
                let quote = compute_kelly_stake(odds, probability, 1000.0, 0.5);
                assert!(
                    quote.stake >= 0.0,
                    "negative stake at odds={} p={}",
                    odds,
                    probability
                );
            }
        }
    }

    #[test]
    fn kelly_guards_degenerate_odds() {
        assert_eq!(compute_kelly_stake(1.0, 0.99, 1000.0, 0.5).stake, 0.0);
        assert_eq!(compute_kelly_stake(0.0, 0.99, 1000.0, 0.5).stake, 0.0);
    }

    // ============================================================================
    // Risk clamp invariant
    // ============================================================================

    #[test]
    fn risk_adjusted_stake_never_exceeds_bankroll_cap() {
        for kind in [
            RiskProfileKind::Conservative,
            RiskProfileKind::Moderate,
            RiskProfileKind::Aggressive,
        ] {
            let profile = RiskProfile::for_kind(kind);
            for bankroll in [0.0, 50.0, 1000.0, 1_000_000.0] {
                for raw in [0.0, 1.0, 100.0, 1_000_000.0] {
                    let clamped = clamp_stake(raw, bankroll, &profile);
                    assert!(clamped <= bankroll * profile.max_stake_percentage + 1e-9);
                    assert!(clamped >= 0.0);
                }
            }
        }
    }

    // ============================================================================
    // Payout composer
    // ============================================================================

    #[test]
    fn zero_stake_composes_zero_preview() {
        let quote = compose_payout(0.0, 5.0, 0.9);
        assert_eq!(quote.potential_payout, 0.0);
        assert_eq!(quote.expected_value, 0.0);
    }

    #[test]
    fn composer_is_idempotent() {
        let a = compose_payout(42.0, 1.87, 0.61);
        let b = compose_payout(42.0, 1.87, 0.61);
        assert_eq!(a, b);
    }

    // ============================================================================
    // Full pipeline worked example
    // ============================================================================

    #[test]
    fn worked_example_odds_two_p_sixty() {
        // odds=2.0, p=0.6, bankroll=1000, cap 5%:
        // f* = (1*0.6 - 0.4)/1 = 0.2, half-Kelly = 0.1 -> 100, clamped to 50
        let profile = RiskProfile {
            kind: RiskProfileKind::Moderate,
            max_stake_percentage: 0.05,
        };
        let data = build_payout_data(
            &selection("evt-1", 2.0, 0.6),
            1000.0,
            &profile,
            &StakingParams::default(),
        );
        assert!((data.kelly_stake - 100.0).abs() < 1e-9);
        assert!((data.risk_adjusted_stake - 50.0).abs() < 1e-9);
        assert!((data.potential_payout - 100.0).abs() < 1e-9);
        assert!((data.expected_value - 10.0).abs() < 1e-9);
    }

    // ============================================================================
    // Confidence band formatting
    // ============================================================================

    #[test]
    fn degenerate_band_returns_midpoint() {
        let display = format_confidence_band(&ConfidenceBand {
            lower: 10.0,
            upper: 10.0,
            mean: 10.0,
            confidence_level: 0.95,
        });
        assert_eq!(display.mean_ratio, 0.5);
        assert_eq!(display.width, 0.0);
    }

    #[test]
    fn band_ratio_scales_linearly() {
        let display = format_confidence_band(&ConfidenceBand {
            lower: 0.0,
            upper: 40.0,
            mean: 10.0,
            confidence_level: 0.9,
        });
        assert!((display.mean_ratio - 0.25).abs() < 1e-9);
    }

    // ============================================================================
    // Preview table semantics
    // ============================================================================

    #[tokio::test]
    async fn preview_table_overwrites_per_event() {
        let book = PreviewBook::new();
        let profile = RiskProfile::for_kind(RiskProfileKind::Moderate);
        let params = StakingParams::default();

        book.upsert_selection(selection("evt-1", 2.0, 0.6), 1000.0, &profile, &params)
            .await;
        book.upsert_selection(selection("evt-1", 3.0, 0.5), 1000.0, &profile, &params)
            .await;

        assert_eq!(book.len().await, 1);
        let stored = book.get_selection("evt-1").await.unwrap();
        assert!((stored.odds - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn recompute_tracks_bankroll_changes() {
        let book = PreviewBook::new();
        let profile = RiskProfile::for_kind(RiskProfileKind::Moderate);
        let params = StakingParams::default();

        book.upsert_selection(selection("evt-1", 2.0, 0.6), 1000.0, &profile, &params)
            .await;
        let before = book.get_preview("evt-1").await.unwrap();
        assert!((before.risk_adjusted_stake - 50.0).abs() < 1e-9);

        book.recompute_all(100.0, &profile, &params).await;
        let after = book.get_preview("evt-1").await.unwrap();
        assert!((after.risk_adjusted_stake - 5.0).abs() < 1e-9);
    }

    // ============================================================================
    // Prediction boundary validation
    // ============================================================================

    fn raw_prediction(event_id: &str) -> RawPrediction {
        RawPrediction {
            event_id: Some(event_id.to_string()),
            win_probability: Some(0.58),
            confidence_band: Some(RawConfidenceBand {
                lower: Some(100.5),
                upper: Some(119.5),
                mean: Some(111.0),
                confidence_level: Some(0.95),
            }),
            model_version: Some("xgb-2024.06".to_string()),
            generated_at: Some(1_720_000_000_000),
        }
    }

    #[test]
    fn boundary_accepts_well_formed_payloads() {
        let prediction = normalize(raw_prediction("nba-lal-bos-2024")).unwrap();
        assert_eq!(prediction.event_id, "nba-lal-bos-2024");
        let display = format_confidence_band(&prediction.band);
        assert!(display.mean_ratio > 0.5 && display.mean_ratio < 0.6);
    }

    #[test]
    fn boundary_rejects_probability_out_of_range() {
        let mut raw = raw_prediction("evt-1");
        raw.win_probability = Some(-0.2);
        assert!(matches!(
            normalize(raw),
            Err(NormalizeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn boundary_rejects_missing_band() {
        let mut raw = raw_prediction("evt-1");
        raw.confidence_band = None;
        assert_eq!(
            normalize(raw),
            Err(NormalizeError::MissingField("confidenceBand"))
        );
    }

    #[tokio::test]
    async fn prediction_store_serves_latest_per_event() {
        let store = PredictionStore::new();
        store
            .apply_update(normalize(raw_prediction("evt-1")).unwrap())
            .await;

        let mut newer = raw_prediction("evt-1");
        newer.win_probability = Some(0.64);
        store.apply_update(normalize(newer).unwrap()).await;

        assert_eq!(store.len().await, 1);
        let latest = store.get("evt-1").await.unwrap();
        assert!((latest.win_probability - 0.64).abs() < 1e-9);
    }

    // ============================================================================
    // Bankroll settlement flow
    // ============================================================================

    #[test]
    fn settlements_drive_the_tracker() {
        let store = BankrollStore::new(500.0, RiskProfile::default());
        store.record_settlement("evt-1", 25.0, 2.2, BetResult::Won);
        store.record_settlement("evt-2", 25.0, 1.8, BetResult::Lost);

        let snapshot = store.snapshot();
        assert!((snapshot.balance - 505.0).abs() < 1e-9);
        assert_eq!(snapshot.stats.bets, 2);
        assert_eq!(snapshot.stats.wins, 1);
        assert_eq!(snapshot.stats.losses, 1);
    }
}
