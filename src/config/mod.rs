//! Configuration management for WagerDesk
//!
//! Loads from YAML/TOML files + environment variables via .env

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::staking::StakingParams;
use crate::types::{RiskProfile, RiskProfileKind};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub staking: StakingConfig,
    pub risk: RiskConfig,
    pub predictions: PredictionsConfig,
    pub bankroll: BankrollConfig,
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Dashboard API port
    pub port: u16,
    /// Seconds between dashboard heartbeat/state broadcasts
    pub broadcast_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StakingConfig {
    /// Fraction of full Kelly to apply (0.5 = half-Kelly)
    pub kelly_multiplier: f64,
    /// Stakes below this round down to zero
    pub min_stake: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Active profile preset (conservative | moderate | aggressive)
    pub profile: String,
    /// Per-preset caps on a single stake as a fraction of bankroll
    pub conservative_max_pct: f64,
    pub moderate_max_pct: f64,
    pub aggressive_max_pct: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionsConfig {
    /// Prediction API base URL
    pub base_url: String,
    /// Optional push stream URL; empty disables the stream
    pub ws_url: String,
    /// Seconds between REST polls
    pub poll_interval_secs: u64,
    /// Snapshot staleness threshold in milliseconds
    pub staleness_ms: i64,
    /// Event ids to track; empty means "whatever the backend serves"
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BankrollConfig {
    /// Starting bankroll
    pub initial_balance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Data directory
    pub data_dir: String,
    /// Enable CSV logging
    pub csv_enabled: bool,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Server defaults
            .set_default("server.port", 8090)?
            .set_default("server.broadcast_interval_secs", 15)?
            // Staking defaults
            .set_default("staking.kelly_multiplier", 0.5)?
            .set_default("staking.min_stake", 0.0)?
            // Risk defaults
            .set_default("risk.profile", "moderate")?
            .set_default("risk.conservative_max_pct", 0.02)?
            .set_default("risk.moderate_max_pct", 0.05)?
            .set_default("risk.aggressive_max_pct", 0.10)?
            // Predictions defaults
            .set_default("predictions.base_url", "http://localhost:9000")?
            .set_default("predictions.ws_url", "")?
            .set_default("predictions.poll_interval_secs", 30)?
            .set_default("predictions.staleness_ms", 120_000)?
            .set_default("predictions.events", Vec::<String>::new())?
            // Bankroll defaults
            .set_default("bankroll.initial_balance", 1000.0)?
            // Persistence defaults
            .set_default("persistence.data_dir", "./data")?
            .set_default("persistence.csv_enabled", true)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (WAGERDESK_*)
            .add_source(Environment::with_prefix("WAGERDESK").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Generate a digest of the config for startup logging
    pub fn digest(&self) -> String {
        format!(
            "port={} profile={} kelly_mult={:.2} bankroll={:.2} predictions={}",
            self.server.port,
            self.risk.profile,
            self.staking.kelly_multiplier,
            self.bankroll.initial_balance,
            self.predictions.base_url
        )
    }

    /// Reject out-of-range numerics before the service starts
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.staking.kelly_multiplier)
            || self.staking.kelly_multiplier == 0.0
        {
            bail!(
                "staking.kelly_multiplier must be in (0, 1], got {}",
                self.staking.kelly_multiplier
            );
        }
        for (name, pct) in [
            ("risk.conservative_max_pct", self.risk.conservative_max_pct),
            ("risk.moderate_max_pct", self.risk.moderate_max_pct),
            ("risk.aggressive_max_pct", self.risk.aggressive_max_pct),
        ] {
            if !(0.0..=1.0).contains(&pct) || pct == 0.0 {
                bail!("{} must be in (0, 1], got {}", name, pct);
            }
        }
        if RiskProfileKind::from_str(&self.risk.profile).is_none() {
            bail!("risk.profile must be one of conservative|moderate|aggressive");
        }
        if self.bankroll.initial_balance < 0.0 {
            bail!("bankroll.initial_balance must be >= 0");
        }
        if self.staking.min_stake < 0.0 {
            bail!("staking.min_stake must be >= 0");
        }
        Ok(())
    }

    /// Resolve the active risk profile with its configured cap
    pub fn risk_profile(&self) -> RiskProfile {
        let kind = RiskProfileKind::from_str(&self.risk.profile).unwrap_or_default();
        RiskProfile {
            kind,
            max_stake_percentage: self.max_pct_for(kind),
        }
    }

    /// Cap for a preset as configured (used when the settings API switches profiles)
    pub fn max_pct_for(&self, kind: RiskProfileKind) -> f64 {
        match kind {
            RiskProfileKind::Conservative => self.risk.conservative_max_pct,
            RiskProfileKind::Moderate => self.risk.moderate_max_pct,
            RiskProfileKind::Aggressive => self.risk.aggressive_max_pct,
        }
    }

    /// Staking tunables for the sizing pipeline
    pub fn staking_params(&self) -> StakingParams {
        StakingParams {
            kelly_multiplier: self.staking.kelly_multiplier,
            min_stake: self.staking.min_stake,
        }
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
