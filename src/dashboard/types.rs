//! Dashboard API Types
//!
//! DTOs for HTTP/WebSocket communication with the React frontend.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::bands::format_confidence_band;
use crate::bankroll::BankrollState;
use crate::types::{BetSelection, PayoutData, Prediction};

// ─────────────────────────────────────────────────────────────────
// Response Types
// ─────────────────────────────────────────────────────────────────

/// Complete dashboard state shared with the frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardState {
    pub previews: HashMap<String, PreviewResponse>,
    pub bands: Vec<BandResponse>,
    pub bankroll: BankrollResponse,
    pub health: HealthResponse,
    pub timestamp: i64,
}

/// One bet-slip row: the selection plus its derived preview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub event_id: String,
    pub odds: f64,
    pub probability: f64,
    pub stake_override: Option<f64>,
    pub kelly_stake: f64,
    pub risk_adjusted_stake: f64,
    pub potential_payout: f64,
    pub expected_value: f64,
}

impl PreviewResponse {
    pub fn from_parts(selection: &BetSelection, data: &PayoutData) -> Self {
        Self {
            event_id: selection.event_id.clone(),
            odds: selection.odds,
            probability: selection.probability,
            stake_override: selection.stake,
            kelly_stake: data.kelly_stake,
            risk_adjusted_stake: data.risk_adjusted_stake,
            potential_payout: data.potential_payout,
            expected_value: data.expected_value,
        }
    }
}

/// Confidence band formatted for bar-chart rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandResponse {
    pub event_id: String,
    pub win_probability: f64,
    pub lower: f64,
    pub upper: f64,
    pub mean: f64,
    pub mean_ratio: f64,
    pub width: f64,
    pub confidence_level: f64,
    pub model_version: String,
    pub generated_at: i64,
}

impl From<&Prediction> for BandResponse {
    fn from(prediction: &Prediction) -> Self {
        let display = format_confidence_band(&prediction.band);
        Self {
            event_id: prediction.event_id.clone(),
            win_probability: prediction.win_probability,
            lower: display.lower,
            upper: display.upper,
            mean: prediction.band.mean,
            mean_ratio: display.mean_ratio,
            width: display.width,
            confidence_level: display.confidence_level,
            model_version: prediction.model_version.clone(),
            generated_at: prediction.generated_at,
        }
    }
}

/// Bankroll tracker state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankrollResponse {
    pub balance: f64,
    pub initial_balance: f64,
    pub peak_balance: f64,
    pub profile: String,
    pub max_stake_percentage: f64,
    pub bets: u32,
    pub wins: u32,
    pub losses: u32,
    pub voids: u32,
    pub win_rate: f64,
    pub total_pnl: f64,
}

impl From<&BankrollState> for BankrollResponse {
    fn from(state: &BankrollState) -> Self {
        let decided = state.stats.wins + state.stats.losses;
        let win_rate = if decided > 0 {
            (state.stats.wins as f64 / decided as f64) * 100.0
        } else {
            0.0
        };
        Self {
            balance: state.balance,
            initial_balance: state.initial_balance,
            peak_balance: state.peak_balance,
            profile: state.profile.kind.to_string(),
            max_stake_percentage: state.profile.max_stake_percentage,
            bets: state.stats.bets,
            wins: state.stats.wins,
            losses: state.stats.losses,
            voids: state.stats.voids,
            win_rate,
            total_pnl: state.stats.total_pnl,
        }
    }
}

/// Prediction feed health for /api/health
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HealthResponse {
    pub feed_connected: bool,
    pub last_refresh_ts: i64,
    pub snapshot_age_ms: i64,
    pub stale: bool,
    pub reconnect_count: u64,
    pub tracked_events: usize,
    pub active_selections: usize,
}

/// Settlement outcome returned by POST /api/settlements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementResponse {
    pub event_id: String,
    pub stake: f64,
    pub odds: f64,
    pub result: String,
    pub pnl: f64,
    pub balance_after: f64,
}

// ─────────────────────────────────────────────────────────────────
// Request Types
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SelectionRequest {
    pub event_id: String,
    pub odds: f64,
    pub probability: f64,
    #[serde(default)]
    pub stake: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskSettingsRequest {
    /// conservative | moderate | aggressive
    pub profile: String,
    /// Optional cap override; preset default applies when absent
    #[serde(default)]
    pub max_stake_percentage: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BankrollRequest {
    pub balance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettlementRequest {
    pub event_id: String,
    /// won | lost | void
    pub result: String,
}

// ─────────────────────────────────────────────────────────────────
// WebSocket Message Types
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// Full state update (sent on connect)
    FullState(DashboardState),
    /// One preview recomputed
    PreviewUpdate(PreviewResponse),
    /// Selection dropped from the slip
    PreviewRemoved { event_id: String },
    /// Full preview table after a bankroll/profile change
    PreviewsUpdate(HashMap<String, PreviewResponse>),
    /// Confidence bands refreshed
    BandUpdate(Vec<BandResponse>),
    /// Bankroll tracker changed
    BankrollUpdate(BankrollResponse),
    /// Heartbeat
    Heartbeat(i64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
