//! Dashboard HTTP API
//!
//! REST endpoints for the React frontend.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::types::*;
use super::{DashboardContext, WebSocketBroadcaster};
use crate::persistence::{BankrollSnapshotRecord, SettlementRecord};
use crate::types::{BetResult, BetSelection, RiskProfile, RiskProfileKind};

/// Create the API router with all endpoints
pub fn create_router(
    context: Arc<DashboardContext>,
    broadcaster: WebSocketBroadcaster,
) -> Router {
    Router::new()
        // Main endpoints
        .route("/api/state", get(get_state))
        .route("/api/previews", get(get_previews))
        .route("/api/previews/:event_id", get(get_preview))
        .route("/api/selections", post(post_selection))
        .route("/api/selections/:event_id", delete(delete_selection))
        .route("/api/bands", get(get_bands))
        .route("/api/bankroll", get(get_bankroll))
        .route("/api/settings/risk", put(put_risk_settings))
        .route("/api/settings/bankroll", put(put_bankroll))
        .route("/api/settlements", post(post_settlement))
        .route("/api/health", get(get_health))
        // WebSocket
        .route("/ws", get(websocket_handler))
        // State
        .with_state((context, broadcaster))
        // CORS for frontend
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

// ─────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────

/// GET /api/state - Complete dashboard state
async fn get_state(
    State((context, _)): State<(Arc<DashboardContext>, WebSocketBroadcaster)>,
) -> impl IntoResponse {
    let state = context.get_state().await;
    Json(ApiResponse::success(state))
}

/// GET /api/previews - All cached payout previews
async fn get_previews(
    State((context, _)): State<(Arc<DashboardContext>, WebSocketBroadcaster)>,
) -> impl IntoResponse {
    let previews = context.previews_response().await;
    Json(ApiResponse::success(previews))
}

/// GET /api/previews/:event_id - One cached preview
async fn get_preview(
    Path(event_id): Path<String>,
    State((context, _)): State<(Arc<DashboardContext>, WebSocketBroadcaster)>,
) -> impl IntoResponse {
    let selection = context.book.get_selection(&event_id).await;
    let data = context.book.get_preview(&event_id).await;
    match (selection, data) {
        (Some(selection), Some(data)) => Json(ApiResponse::success(
            PreviewResponse::from_parts(&selection, &data),
        )),
        _ => Json(ApiResponse::error(format!(
            "no selection for event {}",
            event_id
        ))),
    }
}

/// POST /api/selections - Upsert a selection and recompute its preview
async fn post_selection(
    State((context, broadcaster)): State<(Arc<DashboardContext>, WebSocketBroadcaster)>,
    Json(request): Json<SelectionRequest>,
) -> impl IntoResponse {
    if request.event_id.trim().is_empty() {
        return Json(ApiResponse::<PreviewResponse>::error("event_id is required"));
    }
    if !request.odds.is_finite() || !request.probability.is_finite() {
        return Json(ApiResponse::<PreviewResponse>::error(
            "odds and probability must be finite numbers",
        ));
    }

    let selection = BetSelection {
        event_id: request.event_id,
        odds: request.odds,
        probability: request.probability,
        stake: request.stake,
    };

    let preview = context.apply_selection(selection).await;
    broadcaster.broadcast_preview(preview.clone());
    Json(ApiResponse::success(preview))
}

/// DELETE /api/selections/:event_id - Deselect and drop the preview
async fn delete_selection(
    Path(event_id): Path<String>,
    State((context, broadcaster)): State<(Arc<DashboardContext>, WebSocketBroadcaster)>,
) -> impl IntoResponse {
    if context.book.remove_selection(&event_id).await {
        broadcaster.broadcast_preview_removed(event_id.clone());
        Json(ApiResponse::success(event_id))
    } else {
        Json(ApiResponse::error(format!(
            "no selection for event {}",
            event_id
        )))
    }
}

/// GET /api/bands - Formatted confidence bands
async fn get_bands(
    State((context, _)): State<(Arc<DashboardContext>, WebSocketBroadcaster)>,
) -> impl IntoResponse {
    let bands = context.bands_response().await;
    Json(ApiResponse::success(bands))
}

/// GET /api/bankroll - Bankroll tracker state
async fn get_bankroll(
    State((context, _)): State<(Arc<DashboardContext>, WebSocketBroadcaster)>,
) -> impl IntoResponse {
    Json(ApiResponse::success(context.bankroll_response()))
}

/// PUT /api/settings/risk - Switch risk profile and recompute previews
async fn put_risk_settings(
    State((context, broadcaster)): State<(Arc<DashboardContext>, WebSocketBroadcaster)>,
    Json(request): Json<RiskSettingsRequest>,
) -> impl IntoResponse {
    let kind = match RiskProfileKind::from_str(&request.profile) {
        Some(kind) => kind,
        None => {
            return Json(ApiResponse::<BankrollResponse>::error(
                "profile must be one of conservative|moderate|aggressive",
            ))
        }
    };

    let max_stake_percentage = match request.max_stake_percentage {
        Some(pct) if pct.is_finite() && pct > 0.0 && pct <= 1.0 => pct,
        Some(_) => {
            return Json(ApiResponse::<BankrollResponse>::error(
                "max_stake_percentage must be in (0, 1]",
            ))
        }
        None => context.caps.max_pct_for(kind),
    };

    context.bankroll.set_risk_profile(RiskProfile {
        kind,
        max_stake_percentage,
    });

    let previews = context.recompute_previews().await;
    broadcaster.broadcast_previews(previews);
    let bankroll = context.bankroll_response();
    broadcaster.broadcast_bankroll(bankroll.clone());
    Json(ApiResponse::success(bankroll))
}

/// PUT /api/settings/bankroll - Edit the bankroll and recompute previews
async fn put_bankroll(
    State((context, broadcaster)): State<(Arc<DashboardContext>, WebSocketBroadcaster)>,
    Json(request): Json<BankrollRequest>,
) -> impl IntoResponse {
    if !request.balance.is_finite() || request.balance < 0.0 {
        return Json(ApiResponse::<BankrollResponse>::error(
            "balance must be a finite number >= 0",
        ));
    }

    context.bankroll.set_balance(request.balance);

    let previews = context.recompute_previews().await;
    broadcaster.broadcast_previews(previews);
    let bankroll = context.bankroll_response();
    broadcaster.broadcast_bankroll(bankroll.clone());
    Json(ApiResponse::success(bankroll))
}

/// POST /api/settlements - Settle a selection against the bankroll
async fn post_settlement(
    State((context, broadcaster)): State<(Arc<DashboardContext>, WebSocketBroadcaster)>,
    Json(request): Json<SettlementRequest>,
) -> impl IntoResponse {
    let result = match BetResult::from_str(&request.result) {
        Some(result) => result,
        None => {
            return Json(ApiResponse::<SettlementResponse>::error(
                "result must be one of won|lost|void",
            ))
        }
    };

    let selection = match context.book.get_selection(&request.event_id).await {
        Some(selection) => selection,
        None => {
            return Json(ApiResponse::<SettlementResponse>::error(format!(
                "no selection for event {}",
                request.event_id
            )))
        }
    };
    let stake = context
        .book
        .get_preview(&request.event_id)
        .await
        .map(|data| data.risk_adjusted_stake)
        .unwrap_or(0.0);

    let settlement =
        context
            .bankroll
            .record_settlement(&request.event_id, stake, selection.odds, result);

    if let Err(e) = context
        .persistence
        .save_settlement(SettlementRecord {
            timestamp: settlement.settled_at,
            settlement_id: settlement.id.clone(),
            event_id: settlement.event_id.clone(),
            stake: settlement.stake,
            odds: settlement.odds,
            result: settlement.result.to_string(),
            pnl: settlement.pnl,
            balance_after: settlement.balance_after,
        })
        .await
    {
        tracing::warn!(error = %e, "Failed to persist settlement record");
    }

    let snapshot = context.bankroll.snapshot();
    if let Err(e) = context
        .persistence
        .save_bankroll_snapshot(BankrollSnapshotRecord {
            timestamp: snapshot.updated_at,
            balance: snapshot.balance,
            peak_balance: snapshot.peak_balance,
            total_pnl: snapshot.stats.total_pnl,
            bets: snapshot.stats.bets,
            wins: snapshot.stats.wins,
            losses: snapshot.stats.losses,
        })
        .await
    {
        tracing::warn!(error = %e, "Failed to persist bankroll snapshot");
    }

    context.book.remove_selection(&request.event_id).await;
    broadcaster.broadcast_preview_removed(request.event_id.clone());
    broadcaster.broadcast_bankroll(context.bankroll_response());

    Json(ApiResponse::success(SettlementResponse {
        event_id: settlement.event_id,
        stake: settlement.stake,
        odds: settlement.odds,
        result: settlement.result.to_string(),
        pnl: settlement.pnl,
        balance_after: settlement.balance_after,
    }))
}

/// GET /api/health - Prediction feed health/staleness
async fn get_health(
    State((context, _)): State<(Arc<DashboardContext>, WebSocketBroadcaster)>,
) -> impl IntoResponse {
    let health = context.health_response().await;
    Json(ApiResponse::success(health))
}

// ─────────────────────────────────────────────────────────────────
// WebSocket Handler
// ─────────────────────────────────────────────────────────────────

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};

/// WebSocket upgrade handler
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State((context, broadcaster)): State<(Arc<DashboardContext>, WebSocketBroadcaster)>,
) -> Response {
    ws.on_upgrade(move |socket| handle_websocket(socket, context, broadcaster))
}

/// Outgoing message type for WebSocket
enum OutgoingMessage {
    Text(String),
    Pong(Vec<u8>),
}

/// Handle WebSocket connection
async fn handle_websocket(
    socket: WebSocket,
    context: Arc<DashboardContext>,
    broadcaster: WebSocketBroadcaster,
) {
    use futures_util::{SinkExt, StreamExt};

    tracing::info!("New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();

    // Send initial state
    let initial_state = context.get_state().await;
    let msg = WsMessage::FullState(initial_state);
    if let Ok(json) = serde_json::to_string(&msg) {
        if sender.send(Message::Text(json)).await.is_err() {
            return;
        }
    }

    // Subscribe to broadcasts
    let mut rx = broadcaster.subscribe();

    // Channel for outgoing messages
    let (out_tx, mut out_rx) = tokio::sync::mpsc::channel::<OutgoingMessage>(32);

    // Spawn task to send outgoing messages
    let send_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let result = match msg {
                OutgoingMessage::Text(text) => sender.send(Message::Text(text)).await,
                OutgoingMessage::Pong(data) => sender.send(Message::Pong(data)).await,
            };
            if result.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages (ping/pong) and broadcast updates
    loop {
        tokio::select! {
            // Broadcast updates
            broadcast_msg = rx.recv() => {
                if let Ok(msg) = broadcast_msg {
                    if out_tx.send(OutgoingMessage::Text(msg)).await.is_err() {
                        break;
                    }
                }
            }
            // Incoming messages
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        // Respond with pong via the outgoing channel
                        if out_tx.send(OutgoingMessage::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received WebSocket message: {}", text);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    send_task.abort();
    tracing::info!("WebSocket connection closed");
}
