//! WagerDesk Library
//!
//! Stake sizing and payout analytics for sports-betting dashboards

pub mod bands;
pub mod bankroll;
pub mod config;
pub mod persistence;
pub mod predictions;
pub mod staking;
pub mod types;

#[cfg(feature = "dashboard")]
pub mod dashboard;
