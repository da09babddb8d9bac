//! Prediction feed: ingest, normalization and snapshot store.
//!
//! The backend model service speaks duck-typed JSON; everything entering
//! this process is validated into strict [`Prediction`] records at the
//! boundary. Fetch or stream failures keep the last snapshot so the UI can
//! fall back to stale data instead of an empty chart.

mod client;
mod stream;

pub use client::PredictionClient;
pub use stream::PredictionStream;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use tokio::sync::RwLock;

use crate::types::{ConfidenceBand, Prediction};

/// Trait for prediction feed clients
#[async_trait]
pub trait PredictionSource: Send + Sync {
    /// Get the source name
    fn name(&self) -> &'static str;

    /// Connect to the source and start delivering events
    async fn connect(&mut self, tx: Sender<FeedEvent>) -> Result<()>;

    /// Subscribe to events by id
    async fn subscribe(&mut self, event_ids: &[String]) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;
}

/// Events from prediction sources
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Full snapshot from a poll cycle
    Snapshot(Vec<Prediction>),
    /// Single prediction pushed over the stream
    Update(Prediction),
    /// Connection status changed
    Connected(String),
    Disconnected(String),
    /// Error occurred
    Error(String, String),
}

/// Raw prediction row as the backend serves it
///
/// Every field is optional; [`normalize`] decides what is usable.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPrediction {
    #[serde(rename = "eventId")]
    pub event_id: Option<String>,
    #[serde(rename = "winProbability")]
    pub win_probability: Option<f64>,
    #[serde(rename = "confidenceBand")]
    pub confidence_band: Option<RawConfidenceBand>,
    #[serde(rename = "modelVersion")]
    pub model_version: Option<String>,
    #[serde(rename = "generatedAt")]
    pub generated_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawConfidenceBand {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub mean: Option<f64>,
    #[serde(rename = "confidenceLevel")]
    pub confidence_level: Option<f64>,
}

/// Why a raw prediction row was rejected at the boundary
#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("non-finite value in field: {0}")]
    NonFinite(&'static str),
    #[error("field {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

fn require_finite(value: Option<f64>, field: &'static str) -> Result<f64, NormalizeError> {
    let v = value.ok_or(NormalizeError::MissingField(field))?;
    if !v.is_finite() {
        return Err(NormalizeError::NonFinite(field));
    }
    Ok(v)
}

/// Validate a raw backend row into a strict [`Prediction`].
pub fn normalize(raw: RawPrediction) -> Result<Prediction, NormalizeError> {
    let event_id = raw
        .event_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(NormalizeError::MissingField("eventId"))?;

    let win_probability = require_finite(raw.win_probability, "winProbability")?;
    if !(0.0..=1.0).contains(&win_probability) {
        return Err(NormalizeError::OutOfRange {
            field: "winProbability",
            value: win_probability,
        });
    }

    let band = raw
        .confidence_band
        .ok_or(NormalizeError::MissingField("confidenceBand"))?;
    let lower = require_finite(band.lower, "confidenceBand.lower")?;
    let upper = require_finite(band.upper, "confidenceBand.upper")?;
    let mean = require_finite(band.mean, "confidenceBand.mean")?;
    let confidence_level = require_finite(band.confidence_level, "confidenceBand.confidenceLevel")?;
    if upper < lower {
        return Err(NormalizeError::OutOfRange {
            field: "confidenceBand.upper",
            value: upper,
        });
    }

    Ok(Prediction {
        event_id,
        win_probability,
        band: ConfidenceBand {
            lower,
            upper,
            mean,
            confidence_level,
        },
        model_version: raw.model_version.unwrap_or_else(|| "unknown".to_string()),
        generated_at: raw.generated_at.unwrap_or(0),
    })
}

/// Latest prediction per event, plus feed health
#[derive(Debug, Default)]
pub struct PredictionStore {
    predictions: RwLock<HashMap<String, Prediction>>,
    last_refresh_ms: RwLock<i64>,
    connected: RwLock<bool>,
    reconnect_count: AtomicU64,
}

impl PredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a poll snapshot; entries absent from the snapshot stay stale
    /// rather than disappearing mid-render.
    pub async fn apply_snapshot(&self, snapshot: Vec<Prediction>) {
        let mut predictions = self.predictions.write().await;
        for prediction in snapshot {
            predictions.insert(prediction.event_id.clone(), prediction);
        }
        drop(predictions);
        *self.last_refresh_ms.write().await = chrono::Utc::now().timestamp_millis();
    }

    /// Upsert a single streamed prediction
    pub async fn apply_update(&self, prediction: Prediction) {
        self.predictions
            .write()
            .await
            .insert(prediction.event_id.clone(), prediction);
        *self.last_refresh_ms.write().await = chrono::Utc::now().timestamp_millis();
    }

    pub async fn get(&self, event_id: &str) -> Option<Prediction> {
        self.predictions.read().await.get(event_id).cloned()
    }

    pub async fn all(&self) -> Vec<Prediction> {
        self.predictions.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.predictions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.predictions.read().await.is_empty()
    }

    pub async fn last_refresh_ms(&self) -> i64 {
        *self.last_refresh_ms.read().await
    }

    /// Whether the snapshot is older than the staleness threshold
    pub async fn is_stale(&self, staleness_ms: i64) -> bool {
        let last = *self.last_refresh_ms.read().await;
        if last == 0 {
            return true;
        }
        chrono::Utc::now().timestamp_millis().saturating_sub(last) > staleness_ms
    }

    pub async fn set_connected(&self, connected: bool) {
        let mut flag = self.connected.write().await;
        if connected && !*flag {
            self.reconnect_count.fetch_add(1, Ordering::Relaxed);
        }
        *flag = connected;
    }

    pub async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }

    pub fn reconnect_count(&self) -> u64 {
        self.reconnect_count.load(Ordering::Relaxed)
    }
}

/// Drain feed events into the store.
///
/// Runs until every source sender is dropped. Fetch errors only log; the
/// previous snapshot stays in place for stale display.
pub async fn run_feed(
    store: std::sync::Arc<PredictionStore>,
    mut rx: tokio::sync::mpsc::Receiver<FeedEvent>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            FeedEvent::Snapshot(predictions) => {
                tracing::debug!(count = predictions.len(), "prediction snapshot received");
                store.apply_snapshot(predictions).await;
            }
            FeedEvent::Update(prediction) => {
                tracing::debug!(event_id = %prediction.event_id, "prediction update received");
                store.apply_update(prediction).await;
            }
            FeedEvent::Connected(source) => {
                tracing::info!(source = %source, "prediction source connected");
                store.set_connected(true).await;
            }
            FeedEvent::Disconnected(source) => {
                tracing::warn!(source = %source, "prediction source disconnected");
                store.set_connected(false).await;
            }
            FeedEvent::Error(source, message) => {
                tracing::warn!(source = %source, error = %message, "prediction source error");
            }
        }
    }
    tracing::info!("prediction feed closed");
}
