//! Bankroll and settings store backing the tracker widget.
//!
//! Holds the current bankroll and the active risk profile; settlements
//! adjust the balance and roll simple win/loss stats.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::types::{BetResult, RiskProfile};

/// Running counters for the tracker widget
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BankrollStats {
    pub bets: u32,
    pub wins: u32,
    pub losses: u32,
    pub voids: u32,
    pub total_staked: f64,
    pub total_pnl: f64,
}

/// Serializable snapshot of the bankroll state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankrollState {
    pub balance: f64,
    pub initial_balance: f64,
    pub peak_balance: f64,
    pub profile: RiskProfile,
    pub stats: BankrollStats,
    pub updated_at: i64,
}

/// One settled bet as applied to the bankroll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub id: String,
    pub event_id: String,
    pub stake: f64,
    pub odds: f64,
    pub result: BetResult,
    pub pnl: f64,
    pub balance_after: f64,
    pub settled_at: i64,
}

/// Process-wide bankroll and risk settings
pub struct BankrollStore {
    initial_balance: f64,
    balance: RwLock<f64>,
    peak_balance: RwLock<f64>,
    profile: RwLock<RiskProfile>,
    stats: RwLock<BankrollStats>,
}

impl BankrollStore {
    pub fn new(initial_balance: f64, profile: RiskProfile) -> Self {
        let balance = initial_balance.max(0.0);
        Self {
            initial_balance: balance,
            balance: RwLock::new(balance),
            peak_balance: RwLock::new(balance),
            profile: RwLock::new(profile),
            stats: RwLock::new(BankrollStats::default()),
        }
    }

    /// Current available balance
    pub fn balance(&self) -> f64 {
        self.balance.read().map(|b| *b).unwrap_or(0.0)
    }

    /// Replace the balance (settings panel edit)
    pub fn set_balance(&self, balance: f64) {
        let balance = balance.max(0.0);
        if let Ok(mut b) = self.balance.write() {
            *b = balance;
        }
        if let Ok(mut peak) = self.peak_balance.write() {
            if balance > *peak {
                *peak = balance;
            }
        }
    }

    /// Active risk profile
    pub fn risk_profile(&self) -> RiskProfile {
        self.profile
            .read()
            .map(|p| *p)
            .unwrap_or_default()
    }

    /// Replace the risk profile (settings panel edit)
    pub fn set_risk_profile(&self, profile: RiskProfile) {
        if let Ok(mut p) = self.profile.write() {
            *p = profile;
        }
    }

    /// Apply a settled bet to the bankroll and stats.
    ///
    /// Won pays `stake * (odds - 1)`, Lost costs the stake, Void is flat.
    pub fn record_settlement(
        &self,
        event_id: &str,
        stake: f64,
        odds: f64,
        result: BetResult,
    ) -> Settlement {
        let stake = stake.max(0.0);
        let pnl = match result {
            BetResult::Won => stake * (odds - 1.0).max(0.0),
            BetResult::Lost => -stake,
            BetResult::Void => 0.0,
        };

        let balance_after = {
            let mut balance = match self.balance.write() {
                Ok(b) => b,
                Err(poisoned) => poisoned.into_inner(),
            };
            *balance = (*balance + pnl).max(0.0);
            *balance
        };

        if let Ok(mut peak) = self.peak_balance.write() {
            if balance_after > *peak {
                *peak = balance_after;
            }
        }

        if let Ok(mut stats) = self.stats.write() {
            stats.bets += 1;
            stats.total_staked += stake;
            stats.total_pnl += pnl;
            match result {
                BetResult::Won => stats.wins += 1,
                BetResult::Lost => stats.losses += 1,
                BetResult::Void => stats.voids += 1,
            }
        }

        Settlement {
            id: uuid::Uuid::new_v4().to_string(),
            event_id: event_id.to_string(),
            stake,
            odds,
            result,
            pnl,
            balance_after,
            settled_at: Utc::now().timestamp_millis(),
        }
    }

    /// Full snapshot for the API
    pub fn snapshot(&self) -> BankrollState {
        BankrollState {
            balance: self.balance(),
            initial_balance: self.initial_balance,
            peak_balance: self.peak_balance.read().map(|p| *p).unwrap_or(0.0),
            profile: self.risk_profile(),
            stats: self.stats.read().map(|s| *s).unwrap_or_default(),
            updated_at: Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskProfileKind;

    fn store() -> BankrollStore {
        BankrollStore::new(1000.0, RiskProfile::for_kind(RiskProfileKind::Moderate))
    }

    #[test]
    fn win_pays_net_odds() {
        let s = store();
        let settlement = s.record_settlement("evt-1", 50.0, 2.5, BetResult::Won);
        assert!((settlement.pnl - 75.0).abs() < 1e-9);
        assert!((s.balance() - 1075.0).abs() < 1e-9);
    }

    #[test]
    fn loss_costs_the_stake_and_void_is_flat() {
        let s = store();
        s.record_settlement("evt-1", 50.0, 2.5, BetResult::Lost);
        assert!((s.balance() - 950.0).abs() < 1e-9);
        s.record_settlement("evt-2", 50.0, 2.5, BetResult::Void);
        assert!((s.balance() - 950.0).abs() < 1e-9);
    }

    #[test]
    fn peak_balance_tracks_high_water_mark() {
        let s = store();
        s.record_settlement("evt-1", 100.0, 3.0, BetResult::Won); // 1200
        s.record_settlement("evt-2", 100.0, 2.0, BetResult::Lost); // 1100
        let snap = s.snapshot();
        assert!((snap.peak_balance - 1200.0).abs() < 1e-9);
        assert!((snap.balance - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn balance_never_goes_negative() {
        let s = BankrollStore::new(10.0, RiskProfile::default());
        s.record_settlement("evt-1", 50.0, 2.0, BetResult::Lost);
        assert_eq!(s.balance(), 0.0);
    }

    #[test]
    fn stats_roll_up_by_result() {
        let s = store();
        s.record_settlement("a", 10.0, 2.0, BetResult::Won);
        s.record_settlement("b", 10.0, 2.0, BetResult::Lost);
        s.record_settlement("c", 10.0, 2.0, BetResult::Void);
        let stats = s.snapshot().stats;
        assert_eq!((stats.bets, stats.wins, stats.losses, stats.voids), (3, 1, 1, 1));
        assert!((stats.total_staked - 30.0).abs() < 1e-9);
    }

    #[test]
    fn profile_updates_are_visible() {
        let s = store();
        s.set_risk_profile(RiskProfile::for_kind(RiskProfileKind::Aggressive));
        assert_eq!(s.risk_profile().kind, RiskProfileKind::Aggressive);
    }
}
