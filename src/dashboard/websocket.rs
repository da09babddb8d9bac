//! WebSocket Broadcaster
//!
//! Broadcasts dashboard updates to all connected WebSocket clients.

use super::types::WsMessage;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Channel for broadcasting updates to WebSocket clients
#[derive(Debug, Clone)]
pub struct WebSocketBroadcaster {
    tx: broadcast::Sender<String>,
}

impl WebSocketBroadcaster {
    /// Create a new broadcaster with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to receive broadcast messages
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Broadcast a message to all connected clients
    pub fn broadcast(&self, msg: &WsMessage) {
        if let Ok(json) = serde_json::to_string(msg) {
            // Ignore send errors (no receivers is fine)
            let _ = self.tx.send(json);
        }
    }

    /// Broadcast one recomputed preview
    pub fn broadcast_preview(&self, preview: super::types::PreviewResponse) {
        self.broadcast(&WsMessage::PreviewUpdate(preview));
    }

    /// Broadcast a deselected event
    pub fn broadcast_preview_removed(&self, event_id: String) {
        self.broadcast(&WsMessage::PreviewRemoved { event_id });
    }

    /// Broadcast the full preview table after a settings change
    pub fn broadcast_previews(&self, previews: HashMap<String, super::types::PreviewResponse>) {
        self.broadcast(&WsMessage::PreviewsUpdate(previews));
    }

    /// Broadcast refreshed confidence bands
    pub fn broadcast_bands(&self, bands: Vec<super::types::BandResponse>) {
        self.broadcast(&WsMessage::BandUpdate(bands));
    }

    /// Broadcast bankroll tracker state
    pub fn broadcast_bankroll(&self, bankroll: super::types::BankrollResponse) {
        self.broadcast(&WsMessage::BankrollUpdate(bankroll));
    }

    /// Broadcast heartbeat
    pub fn broadcast_heartbeat(&self) {
        self.broadcast(&WsMessage::Heartbeat(chrono::Utc::now().timestamp_millis()));
    }
}

impl Default for WebSocketBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
