//! Per-event selection and preview table.
//!
//! Holds the active bet slip and the derived payout previews, keyed by
//! event id. Previews are overwritten on every recompute, never appended;
//! deselecting an event drops both rows.

use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{build_payout_data, StakingParams};
use crate::types::{BetSelection, PayoutData, RiskProfile};

/// In-memory table of active selections and their previews
#[derive(Debug, Default)]
pub struct PreviewBook {
    selections: RwLock<HashMap<String, BetSelection>>,
    previews: RwLock<HashMap<String, PayoutData>>,
}

impl PreviewBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a selection and recompute its preview
    pub async fn upsert_selection(
        &self,
        selection: BetSelection,
        bankroll: f64,
        profile: &RiskProfile,
        params: &StakingParams,
    ) -> PayoutData {
        let data = build_payout_data(&selection, bankroll, profile, params);
        let event_id = selection.event_id.clone();

        self.selections
            .write()
            .await
            .insert(event_id.clone(), selection);
        self.previews.write().await.insert(event_id, data);
        data
    }

    /// Drop a selection and its preview; returns true if it existed
    pub async fn remove_selection(&self, event_id: &str) -> bool {
        let removed = self.selections.write().await.remove(event_id).is_some();
        self.previews.write().await.remove(event_id);
        removed
    }

    /// Selection currently on the slip for an event
    pub async fn get_selection(&self, event_id: &str) -> Option<BetSelection> {
        self.selections.read().await.get(event_id).cloned()
    }

    /// Cached preview for an event
    pub async fn get_preview(&self, event_id: &str) -> Option<PayoutData> {
        self.previews.read().await.get(event_id).copied()
    }

    /// Snapshot of every cached preview
    pub async fn all_previews(&self) -> HashMap<String, PayoutData> {
        self.previews.read().await.clone()
    }

    /// Snapshot of every active selection
    pub async fn all_selections(&self) -> Vec<BetSelection> {
        self.selections.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.selections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.selections.read().await.is_empty()
    }

    /// Recompute every preview after a bankroll or profile change.
    ///
    /// Returns the refreshed table so callers can broadcast it.
    pub async fn recompute_all(
        &self,
        bankroll: f64,
        profile: &RiskProfile,
        params: &StakingParams,
    ) -> HashMap<String, PayoutData> {
        let selections = self.selections.read().await;
        let mut refreshed: HashMap<String, PayoutData> = HashMap::with_capacity(selections.len());
        for (event_id, selection) in selections.iter() {
            refreshed.insert(
                event_id.clone(),
                build_payout_data(selection, bankroll, profile, params),
            );
        }
        drop(selections);

        *self.previews.write().await = refreshed.clone();
        refreshed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskProfileKind;

    fn selection(event_id: &str) -> BetSelection {
        BetSelection {
            event_id: event_id.to_string(),
            odds: 2.0,
            probability: 0.6,
            stake: None,
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_instead_of_appending() {
        let book = PreviewBook::new();
        let profile = RiskProfile::for_kind(RiskProfileKind::Moderate);
        let params = StakingParams::default();

        book.upsert_selection(selection("evt-1"), 1000.0, &profile, &params)
            .await;
        let mut updated = selection("evt-1");
        updated.probability = 0.7;
        book.upsert_selection(updated, 1000.0, &profile, &params)
            .await;

        assert_eq!(book.len().await, 1);
        let preview = book.get_preview("evt-1").await.unwrap();
        // p 0.7 at odds 2.0: f* = 0.4, half-Kelly 0.2 -> 200, clamped to 50
        assert!((preview.risk_adjusted_stake - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn deselect_drops_selection_and_preview() {
        let book = PreviewBook::new();
        let profile = RiskProfile::default();
        let params = StakingParams::default();

        book.upsert_selection(selection("evt-1"), 1000.0, &profile, &params)
            .await;
        assert!(book.remove_selection("evt-1").await);
        assert!(!book.remove_selection("evt-1").await);
        assert!(book.get_preview("evt-1").await.is_none());
        assert!(book.is_empty().await);
    }

    #[tokio::test]
    async fn bankroll_change_recomputes_every_preview() {
        let book = PreviewBook::new();
        let profile = RiskProfile::for_kind(RiskProfileKind::Moderate);
        let params = StakingParams::default();

        book.upsert_selection(selection("evt-1"), 1000.0, &profile, &params)
            .await;
        book.upsert_selection(selection("evt-2"), 1000.0, &profile, &params)
            .await;

        let refreshed = book.recompute_all(2000.0, &profile, &params).await;
        assert_eq!(refreshed.len(), 2);
        for preview in refreshed.values() {
            // 5% of the doubled bankroll
            assert!((preview.risk_adjusted_stake - 100.0).abs() < 1e-9);
        }
    }
}
