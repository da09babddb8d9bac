//! WagerDesk service binary
//!
//! Wires the prediction feed, the stake-sizing stores and the dashboard API
//! together and runs until ctrl-c.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wagerdesk::config::AppConfig;
use wagerdesk::predictions::{
    run_feed, FeedEvent, PredictionClient, PredictionSource, PredictionStore, PredictionStream,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(config = %config.digest(), "Starting WagerDesk");
    config.validate()?;

    let predictions = Arc::new(PredictionStore::new());

    // Prediction feed: REST poll plus optional push stream
    let (feed_tx, feed_rx) = tokio::sync::mpsc::channel::<FeedEvent>(256);

    let mut client = PredictionClient::new(
        &config.predictions.base_url,
        std::env::var("PREDICTIONS_API_KEY").ok(),
        Duration::from_secs(config.predictions.poll_interval_secs.max(1)),
    )?;
    client.subscribe(&config.predictions.events).await?;
    {
        let tx = feed_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = client.connect(tx).await {
                error!(error = %e, "Prediction poller stopped");
            }
        });
    }

    if !config.predictions.ws_url.is_empty() {
        let mut stream = PredictionStream::new(&config.predictions.ws_url);
        stream.subscribe(&config.predictions.events).await?;
        let tx = feed_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = stream.connect(tx).await {
                error!(error = %e, "Prediction stream stopped");
            }
        });
    }
    drop(feed_tx);

    tokio::spawn(run_feed(predictions.clone(), feed_rx));

    #[cfg(feature = "dashboard")]
    {
        use wagerdesk::bankroll::BankrollStore;
        use wagerdesk::dashboard::{self, DashboardContext, RiskCaps, WebSocketBroadcaster};
        use wagerdesk::persistence::CsvPersistence;
        use wagerdesk::staking::PreviewBook;
        use wagerdesk::types::RiskProfileKind;

        let context = Arc::new(DashboardContext {
            book: Arc::new(PreviewBook::new()),
            predictions: predictions.clone(),
            bankroll: Arc::new(BankrollStore::new(
                config.bankroll.initial_balance,
                config.risk_profile(),
            )),
            persistence: Arc::new(CsvPersistence::new(
                &config.persistence.data_dir,
                config.persistence.csv_enabled,
            )?),
            params: config.staking_params(),
            caps: RiskCaps {
                conservative: config.max_pct_for(RiskProfileKind::Conservative),
                moderate: config.max_pct_for(RiskProfileKind::Moderate),
                aggressive: config.max_pct_for(RiskProfileKind::Aggressive),
            },
            staleness_ms: config.predictions.staleness_ms,
        });
        let broadcaster = WebSocketBroadcaster::default();

        // Periodic band refresh + heartbeat for connected clients
        {
            let context = context.clone();
            let broadcaster = broadcaster.clone();
            let interval_secs = config.server.broadcast_interval_secs.max(1);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
                loop {
                    interval.tick().await;
                    broadcaster.broadcast_bands(context.bands_response().await);
                    broadcaster.broadcast_heartbeat();
                }
            });
        }

        let port = config.server.port;
        tokio::spawn(async move {
            if let Err(e) = dashboard::start_server(context, broadcaster, port).await {
                error!(error = %e, "Dashboard server stopped");
            }
        });
    }

    #[cfg(not(feature = "dashboard"))]
    info!("Dashboard feature disabled; running prediction feed only");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    Ok(())
}
