//! WebSocket stream client for push prediction updates.
//!
//! Connects to the backend's prediction stream and emits single-event
//! updates as they arrive. Reconnects with capped exponential backoff.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{normalize, FeedEvent, PredictionSource, RawPrediction};

const MAX_RECONNECT_ATTEMPTS: u32 = 10;
const BASE_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

/// Streaming client for the prediction backend
#[derive(Debug, Clone)]
pub struct PredictionStream {
    url: String,
    event_ids: Vec<String>,
    connected: bool,
}

impl PredictionStream {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            event_ids: Vec::new(),
            connected: false,
        }
    }

    async fn handle_message(text: &str, tx: &Sender<FeedEvent>) -> Result<()> {
        // Stream frames have format: {"type":"prediction","data":{...}}
        let wrapper: serde_json::Value = serde_json::from_str(text)?;

        let kind = wrapper["type"]
            .as_str()
            .context("Missing type in stream message")?;
        if kind != "prediction" {
            return Ok(());
        }

        let raw: RawPrediction = serde_json::from_value(wrapper["data"].clone())
            .context("Malformed prediction frame")?;
        match normalize(raw) {
            Ok(prediction) => {
                let _ = tx.send(FeedEvent::Update(prediction)).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed streamed prediction");
            }
        }

        Ok(())
    }

    fn subscribe_frame(&self) -> String {
        serde_json::json!({
            "type": "subscribe",
            "events": self.event_ids,
        })
        .to_string()
    }
}

#[async_trait]
impl PredictionSource for PredictionStream {
    fn name(&self) -> &'static str {
        "ws-stream"
    }

    async fn connect(&mut self, tx: Sender<FeedEvent>) -> Result<()> {
        let mut reconnect_attempts = 0u32;

        'reconnect_loop: loop {
            tracing::info!(
                source = %self.name(),
                url = %self.url,
                attempt = reconnect_attempts,
                "Connecting to prediction stream..."
            );

            let (ws_stream, _) = match connect_async(&self.url).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(source = %self.name(), error = %e, "Connection failed");
                    let _ = tx
                        .send(FeedEvent::Error(self.name().to_string(), e.to_string()))
                        .await;

                    if reconnect_attempts >= MAX_RECONNECT_ATTEMPTS {
                        bail!(
                            "Max reconnection attempts ({}) reached",
                            MAX_RECONNECT_ATTEMPTS
                        );
                    }

                    reconnect_attempts += 1;
                    let delay = std::cmp::min(
                        BASE_RECONNECT_DELAY * reconnect_attempts,
                        MAX_RECONNECT_DELAY,
                    );
                    tokio::time::sleep(delay).await;
                    continue 'reconnect_loop;
                }
            };

            let (mut write, mut read) = ws_stream.split();
            self.connected = true;
            reconnect_attempts = 0;

            if !self.event_ids.is_empty() {
                if let Err(e) = write.send(Message::Text(self.subscribe_frame())).await {
                    tracing::error!(source = %self.name(), error = %e, "Subscribe failed");
                }
            }

            let _ = tx
                .send(FeedEvent::Connected(self.name().to_string()))
                .await;
            tracing::info!(source = %self.name(), "Connected to prediction stream");

            let should_reconnect = loop {
                match read.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = Self::handle_message(&text, &tx).await {
                            tracing::warn!(source = %self.name(), error = %e, "Failed to parse frame");
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::warn!(source = %self.name(), "Connection closed by server");
                        break true;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!(source = %self.name(), error = %e, "WebSocket error");
                        let _ = tx
                            .send(FeedEvent::Error(self.name().to_string(), e.to_string()))
                            .await;
                        break true;
                    }
                    None => {
                        tracing::warn!(source = %self.name(), "Stream ended");
                        break true;
                    }
                }
            };

            self.connected = false;
            let _ = tx
                .send(FeedEvent::Disconnected(self.name().to_string()))
                .await;

            if should_reconnect {
                reconnect_attempts += 1;
                if reconnect_attempts > MAX_RECONNECT_ATTEMPTS {
                    bail!(
                        "Max reconnection attempts ({}) reached",
                        MAX_RECONNECT_ATTEMPTS
                    );
                }
                let delay = std::cmp::min(
                    BASE_RECONNECT_DELAY * reconnect_attempts,
                    MAX_RECONNECT_DELAY,
                );
                tracing::info!(
                    source = %self.name(),
                    delay_secs = delay.as_secs(),
                    attempt = reconnect_attempts,
                    "Reconnecting in {} seconds...", delay.as_secs()
                );
                tokio::time::sleep(delay).await;
            } else {
                break 'reconnect_loop;
            }
        }

        Ok(())
    }

    async fn subscribe(&mut self, event_ids: &[String]) -> Result<()> {
        self.event_ids = event_ids.to_vec();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prediction_frames_become_updates() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        let frame = serde_json::json!({
            "type": "prediction",
            "data": {
                "eventId": "evt-3",
                "winProbability": 0.55,
                "confidenceBand": {
                    "lower": 1.0, "upper": 3.0, "mean": 2.1, "confidenceLevel": 0.9
                },
                "modelVersion": "v2",
                "generatedAt": 1700000000000i64
            }
        })
        .to_string();

        PredictionStream::handle_message(&frame, &tx).await.unwrap();
        match rx.recv().await {
            Some(FeedEvent::Update(p)) => assert_eq!(p.event_id, "evt-3"),
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_prediction_frames_are_ignored() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        let frame = serde_json::json!({"type": "heartbeat"}).to_string();
        PredictionStream::handle_message(&frame, &tx).await.unwrap();
        drop(tx);
        assert!(rx.recv().await.is_none());
    }
}
