//! Dashboard Module
//!
//! Provides HTTP/WebSocket API for the React frontend.
//! Only compiled when the `dashboard` feature is enabled.

mod api;
mod types;
mod websocket;

pub use api::create_router;
pub use types::*;
pub use websocket::WebSocketBroadcaster;

use std::collections::HashMap;
use std::sync::Arc;

use crate::bankroll::BankrollStore;
use crate::persistence::{CsvPersistence, PreviewRecord};
use crate::predictions::PredictionStore;
use crate::staking::{PreviewBook, StakingParams};
use crate::types::{BetSelection, PayoutData, RiskProfileKind};

/// Configured per-preset stake caps, used when the settings API switches profiles
#[derive(Debug, Clone, Copy)]
pub struct RiskCaps {
    pub conservative: f64,
    pub moderate: f64,
    pub aggressive: f64,
}

impl RiskCaps {
    pub fn max_pct_for(&self, kind: RiskProfileKind) -> f64 {
        match kind {
            RiskProfileKind::Conservative => self.conservative,
            RiskProfileKind::Moderate => self.moderate,
            RiskProfileKind::Aggressive => self.aggressive,
        }
    }
}

impl Default for RiskCaps {
    fn default() -> Self {
        Self {
            conservative: RiskProfileKind::Conservative.default_max_stake_percentage(),
            moderate: RiskProfileKind::Moderate.default_max_stake_percentage(),
            aggressive: RiskProfileKind::Aggressive.default_max_stake_percentage(),
        }
    }
}

/// Shared state behind the dashboard API
pub struct DashboardContext {
    pub book: Arc<PreviewBook>,
    pub predictions: Arc<PredictionStore>,
    pub bankroll: Arc<BankrollStore>,
    pub persistence: Arc<CsvPersistence>,
    pub params: StakingParams,
    pub caps: RiskCaps,
    pub staleness_ms: i64,
}

impl DashboardContext {
    /// Upsert a selection, persist the preview and return the slip row
    pub async fn apply_selection(&self, selection: BetSelection) -> PreviewResponse {
        let bankroll = self.bankroll.balance();
        let profile = self.bankroll.risk_profile();
        let data = self
            .book
            .upsert_selection(selection.clone(), bankroll, &profile, &self.params)
            .await;

        self.persist_preview(&selection, &data).await;
        PreviewResponse::from_parts(&selection, &data)
    }

    async fn persist_preview(&self, selection: &BetSelection, data: &PayoutData) {
        let record = PreviewRecord {
            timestamp: chrono::Utc::now().timestamp_millis(),
            event_id: selection.event_id.clone(),
            odds: selection.odds,
            probability: selection.probability,
            kelly_stake: data.kelly_stake,
            risk_adjusted_stake: data.risk_adjusted_stake,
            potential_payout: data.potential_payout,
            expected_value: data.expected_value,
            bankroll: self.bankroll.balance(),
            profile: self.bankroll.risk_profile().kind.to_string(),
        };
        if let Err(e) = self.persistence.save_preview(record).await {
            tracing::warn!(error = %e, "Failed to persist preview record");
        }
    }

    /// Recompute the whole preview table after a bankroll/profile change
    pub async fn recompute_previews(&self) -> HashMap<String, PreviewResponse> {
        let bankroll = self.bankroll.balance();
        let profile = self.bankroll.risk_profile();
        self.book
            .recompute_all(bankroll, &profile, &self.params)
            .await;
        self.previews_response().await
    }

    /// Current preview table as API rows
    pub async fn previews_response(&self) -> HashMap<String, PreviewResponse> {
        let selections = self.book.all_selections().await;
        let mut rows = HashMap::with_capacity(selections.len());
        for selection in selections {
            if let Some(data) = self.book.get_preview(&selection.event_id).await {
                rows.insert(
                    selection.event_id.clone(),
                    PreviewResponse::from_parts(&selection, &data),
                );
            }
        }
        rows
    }

    /// Formatted confidence bands, ordered by event id
    pub async fn bands_response(&self) -> Vec<BandResponse> {
        let mut bands: Vec<BandResponse> = self
            .predictions
            .all()
            .await
            .iter()
            .map(BandResponse::from)
            .collect();
        bands.sort_by(|a, b| a.event_id.cmp(&b.event_id));
        bands
    }

    /// Bankroll tracker state as an API row
    pub fn bankroll_response(&self) -> BankrollResponse {
        BankrollResponse::from(&self.bankroll.snapshot())
    }

    /// Feed health snapshot
    pub async fn health_response(&self) -> HealthResponse {
        let last_refresh_ts = self.predictions.last_refresh_ms().await;
        let snapshot_age_ms = if last_refresh_ts > 0 {
            chrono::Utc::now()
                .timestamp_millis()
                .saturating_sub(last_refresh_ts)
        } else {
            i64::MAX
        };
        HealthResponse {
            feed_connected: self.predictions.is_connected().await,
            last_refresh_ts,
            snapshot_age_ms,
            stale: self.predictions.is_stale(self.staleness_ms).await,
            reconnect_count: self.predictions.reconnect_count(),
            tracked_events: self.predictions.len().await,
            active_selections: self.book.len().await,
        }
    }

    /// Get complete dashboard state
    pub async fn get_state(&self) -> DashboardState {
        DashboardState {
            previews: self.previews_response().await,
            bands: self.bands_response().await,
            bankroll: self.bankroll_response(),
            health: self.health_response().await,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Start the dashboard server
pub async fn start_server(
    context: Arc<DashboardContext>,
    broadcaster: WebSocketBroadcaster,
    port: u16,
) -> anyhow::Result<()> {
    let app = create_router(context, broadcaster);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("Dashboard API starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
