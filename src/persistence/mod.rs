//! CSV Persistence Module
//!
//! Handles storage of payout previews, settlements and bankroll snapshots
//! for the tracker widget and offline analysis.

use anyhow::{Context, Result};
use chrono::Utc;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock as AsyncRwLock;
use tracing::warn;

/// Payout preview record for CSV storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRecord {
    pub timestamp: i64,
    pub event_id: String,
    pub odds: f64,
    pub probability: f64,
    pub kelly_stake: f64,
    pub risk_adjusted_stake: f64,
    pub potential_payout: f64,
    pub expected_value: f64,
    pub bankroll: f64,
    pub profile: String,
}

/// Settled bet record for CSV storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub timestamp: i64,
    pub settlement_id: String,
    pub event_id: String,
    pub stake: f64,
    pub odds: f64,
    pub result: String,
    pub pnl: f64,
    pub balance_after: f64,
}

/// Bankroll snapshot record for tracking balance over time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankrollSnapshotRecord {
    pub timestamp: i64,
    pub balance: f64,
    pub peak_balance: f64,
    pub total_pnl: f64,
    pub bets: u32,
    pub wins: u32,
    pub losses: u32,
}

/// CSV persistence manager
pub struct CsvPersistence {
    data_dir: PathBuf,
    enabled: bool,
    preview_writer: Arc<AsyncRwLock<csv::Writer<std::fs::File>>>,
    settlement_writer: Arc<AsyncRwLock<csv::Writer<std::fs::File>>>,
    bankroll_writer: Arc<AsyncRwLock<csv::Writer<std::fs::File>>>,
}

impl CsvPersistence {
    /// Create a new CSV persistence manager
    pub fn new(data_dir: &str, enabled: bool) -> Result<Self> {
        let data_dir = PathBuf::from(data_dir);

        fs::create_dir_all(&data_dir).context("Failed to create data directory")?;
        fs::create_dir_all(data_dir.join("previews"))?;
        fs::create_dir_all(data_dir.join("settlements"))?;
        fs::create_dir_all(data_dir.join("bankroll"))?;

        // Daily files keyed by date
        let today = Utc::now().format("%Y-%m-%d");

        let preview_writer =
            Self::create_writer(&data_dir.join("previews"), &format!("previews_{}.csv", today))?;
        let settlement_writer = Self::create_writer(
            &data_dir.join("settlements"),
            &format!("settlements_{}.csv", today),
        )?;
        let bankroll_writer =
            Self::create_writer(&data_dir.join("bankroll"), &format!("bankroll_{}.csv", today))?;

        Ok(Self {
            data_dir,
            enabled,
            preview_writer: Arc::new(AsyncRwLock::new(preview_writer)),
            settlement_writer: Arc::new(AsyncRwLock::new(settlement_writer)),
            bankroll_writer: Arc::new(AsyncRwLock::new(bankroll_writer)),
        })
    }

    fn create_writer(dir: &Path, filename: &str) -> Result<csv::Writer<std::fs::File>> {
        let path = dir.join(filename);
        let file_has_data =
            path.exists() && fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open CSV file")?;

        let writer = WriterBuilder::new()
            .has_headers(!file_has_data)
            .from_writer(file);

        Ok(writer)
    }

    /// Save a payout preview row
    pub async fn save_preview(&self, record: PreviewRecord) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut writer = self.preview_writer.write().await;
        writer
            .serialize(&record)
            .context("Failed to write preview record")?;
        writer.flush().context("Failed to flush preview writer")?;
        Ok(())
    }

    /// Save a settlement row
    pub async fn save_settlement(&self, record: SettlementRecord) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut writer = self.settlement_writer.write().await;
        writer
            .serialize(&record)
            .context("Failed to write settlement record")?;
        writer.flush().context("Failed to flush settlement writer")?;
        Ok(())
    }

    /// Save a bankroll snapshot row
    pub async fn save_bankroll_snapshot(&self, record: BankrollSnapshotRecord) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut writer = self.bankroll_writer.write().await;
        writer
            .serialize(&record)
            .context("Failed to write bankroll snapshot")?;
        writer.flush().context("Failed to flush bankroll writer")?;
        Ok(())
    }

    /// Load every bankroll snapshot on disk, oldest first.
    ///
    /// Unreadable files are skipped with a warning so one corrupt day never
    /// hides the rest of the history.
    pub fn load_bankroll_history(&self) -> Result<Vec<BankrollSnapshotRecord>> {
        let dir = self.data_dir.join("bankroll");
        let mut records: Vec<BankrollSnapshotRecord> = Vec::new();

        if !dir.exists() {
            return Ok(records);
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
            .with_context(|| format!("Failed reading {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        for path in paths {
            let reader = match ReaderBuilder::new().has_headers(true).from_path(&path) {
                Ok(reader) => reader,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable bankroll CSV");
                    continue;
                }
            };
            for row in reader.into_deserialize::<BankrollSnapshotRecord>() {
                match row {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping malformed bankroll row")
                    }
                }
            }
        }

        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> String {
        let dir = std::env::temp_dir().join(format!(
            "wagerdesk_test_{}_{}",
            tag,
            uuid::Uuid::new_v4()
        ));
        dir.to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn bankroll_snapshots_round_trip() {
        let dir = temp_dir("bankroll");
        let persistence = CsvPersistence::new(&dir, true).unwrap();

        persistence
            .save_bankroll_snapshot(BankrollSnapshotRecord {
                timestamp: 1000,
                balance: 990.0,
                peak_balance: 1010.0,
                total_pnl: -10.0,
                bets: 2,
                wins: 1,
                losses: 1,
            })
            .await
            .unwrap();
        persistence
            .save_bankroll_snapshot(BankrollSnapshotRecord {
                timestamp: 2000,
                balance: 1040.0,
                peak_balance: 1040.0,
                total_pnl: 40.0,
                bets: 3,
                wins: 2,
                losses: 1,
            })
            .await
            .unwrap();

        let history = persistence.load_bankroll_history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].timestamp, 1000);
        assert!((history[1].balance - 1040.0).abs() < 1e-9);

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn disabled_persistence_writes_nothing() {
        let dir = temp_dir("disabled");
        let persistence = CsvPersistence::new(&dir, false).unwrap();

        persistence
            .save_preview(PreviewRecord {
                timestamp: 1000,
                event_id: "evt-1".to_string(),
                odds: 2.0,
                probability: 0.6,
                kelly_stake: 100.0,
                risk_adjusted_stake: 50.0,
                potential_payout: 100.0,
                expected_value: 10.0,
                bankroll: 1000.0,
                profile: "moderate".to_string(),
            })
            .await
            .unwrap();

        // only the header-less empty file exists
        let previews = PathBuf::from(&dir).join("previews");
        let non_empty = fs::read_dir(previews)
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.metadata().map(|m| m.len() > 0).unwrap_or(false));
        assert!(!non_empty);

        let _ = fs::remove_dir_all(&dir);
    }
}
