//! REST polling client for the prediction API.
//!
//! Polls `GET {base}/predictions?events=a,b` on a fixed interval and emits
//! full snapshots. A failed poll emits an error event and leaves the last
//! snapshot in place.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::time::Duration;
use tokio::sync::mpsc::Sender;

use super::{normalize, FeedEvent, PredictionSource, RawPrediction};
use crate::types::Prediction;

/// REST client for the prediction backend
pub struct PredictionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    poll_interval: Duration,
    event_ids: Vec<String>,
    connected: bool,
}

impl PredictionClient {
    /// Create a new client
    pub fn new(base_url: &str, api_key: Option<String>, poll_interval: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            poll_interval,
            event_ids: Vec::new(),
            connected: false,
        })
    }

    /// Fetch and normalize the current predictions for the subscribed events.
    ///
    /// Rows that fail boundary validation are skipped with a warning; a
    /// partially-bad payload still yields the usable rows.
    pub async fn fetch_predictions(&self) -> Result<Vec<Prediction>> {
        let mut url = format!("{}/predictions", self.base_url);
        if !self.event_ids.is_empty() {
            url = format!("{}?events={}", url, self.event_ids.join(","));
        }

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request
            .send()
            .await
            .context("Failed to fetch predictions")?;

        if !response.status().is_success() {
            bail!("Prediction API returned error: {}", response.status());
        }

        let rows: Vec<RawPrediction> = response
            .json()
            .await
            .context("Failed to parse prediction response")?;

        let total = rows.len();
        let predictions: Vec<Prediction> = rows
            .into_iter()
            .filter_map(|raw| match normalize(raw) {
                Ok(prediction) => Some(prediction),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed prediction row");
                    None
                }
            })
            .collect();

        if predictions.len() < total {
            tracing::warn!(
                accepted = predictions.len(),
                total,
                "Prediction payload contained malformed rows"
            );
        }

        Ok(predictions)
    }
}

#[async_trait]
impl PredictionSource for PredictionClient {
    fn name(&self) -> &'static str {
        "rest-poll"
    }

    async fn connect(&mut self, tx: Sender<FeedEvent>) -> Result<()> {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            match self.fetch_predictions().await {
                Ok(predictions) => {
                    if !self.connected {
                        self.connected = true;
                        if tx
                            .send(FeedEvent::Connected(self.name().to_string()))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    if tx.send(FeedEvent::Snapshot(predictions)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Prediction poll failed; keeping last snapshot");
                    if self.connected {
                        self.connected = false;
                        let _ = tx
                            .send(FeedEvent::Disconnected(self.name().to_string()))
                            .await;
                    }
                    if tx
                        .send(FeedEvent::Error(self.name().to_string(), e.to_string()))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
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
