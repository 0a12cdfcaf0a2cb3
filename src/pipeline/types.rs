//! Core data structures for checkpoint outcome tracking
//!
//! - `Checkpoint` - the 7 fixed sampling offsets after detection
//! - `MarketSnapshot` - best-effort point-in-time reading for a token
//! - `ThresholdFlags` - monotonic "reached Nx" flags
//! - `SignalRecord` - the persisted record created at detection
//! - `StoredOutcome` / `OutcomeSummary` - input and output of one recorder fold

use super::error::TrackerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Multiple thresholds tracked per record, ascending
pub const THRESHOLDS: [u32; 7] = [2, 3, 5, 10, 20, 50, 100];

/// Fixed sampling offsets after detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Checkpoint {
    FiveMinutes,
    TwentyMinutes,
    OneHour,
    ThreeHours,
    SixHours,
    OneDay,
    SevenDays,
}

impl Checkpoint {
    /// All checkpoints in ascending offset order
    pub const ALL: [Checkpoint; 7] = [
        Checkpoint::FiveMinutes,
        Checkpoint::TwentyMinutes,
        Checkpoint::OneHour,
        Checkpoint::ThreeHours,
        Checkpoint::SixHours,
        Checkpoint::OneDay,
        Checkpoint::SevenDays,
    ];

    /// The checkpoint whose sample marks a record as complete
    pub const TERMINAL: Checkpoint = Checkpoint::SevenDays;

    /// Stable name used on the command line and in `checkpoint_samples.checkpoint`
    pub fn as_str(&self) -> &'static str {
        match self {
            Checkpoint::FiveMinutes => "5min",
            Checkpoint::TwentyMinutes => "20min",
            Checkpoint::OneHour => "1h",
            Checkpoint::ThreeHours => "3h",
            Checkpoint::SixHours => "6h",
            Checkpoint::OneDay => "24h",
            Checkpoint::SevenDays => "7d",
        }
    }

    /// Human label for logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            Checkpoint::FiveMinutes => "T+5min",
            Checkpoint::TwentyMinutes => "T+20min",
            Checkpoint::OneHour => "T+1h",
            Checkpoint::ThreeHours => "T+3h",
            Checkpoint::SixHours => "T+6h",
            Checkpoint::OneDay => "T+24h",
            Checkpoint::SevenDays => "T+7d",
        }
    }

    /// Minimum record age (seconds since detection) before this checkpoint is due
    pub fn min_age_secs(&self) -> i64 {
        match self {
            Checkpoint::FiveMinutes => 5 * 60,
            Checkpoint::TwentyMinutes => 20 * 60,
            Checkpoint::OneHour => 60 * 60,
            Checkpoint::ThreeHours => 3 * 60 * 60,
            Checkpoint::SixHours => 6 * 60 * 60,
            Checkpoint::OneDay => 24 * 60 * 60,
            Checkpoint::SevenDays => 7 * 24 * 60 * 60,
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == Self::TERMINAL
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Checkpoint {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Checkpoint::ALL
            .iter()
            .copied()
            .find(|cp| cp.as_str() == s)
            .ok_or_else(|| TrackerError::InvalidCheckpoint(s.to_string()))
    }
}

/// Point-in-time market reading for one address
///
/// `market_cap_usd` and `ath_market_cap` use 0.0 for "unknown"; the remaining
/// fields are `None` when the provider did not answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub market_cap_usd: f64,
    pub ath_market_cap: f64,
    pub holders: Option<i64>,
    pub liquidity_usd: Option<f64>,
    pub price_usd: Option<f64>,
    pub buys: Option<i64>,
    pub sells: Option<i64>,
}

impl MarketSnapshot {
    /// No usable market cap or ATH (token likely delisted or the fetch failed)
    pub fn is_empty(&self) -> bool {
        !(self.market_cap_usd > 0.0) && !(self.ath_market_cap > 0.0)
    }
}

/// One boolean per entry of `THRESHOLDS`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdFlags([bool; 7]);

impl ThresholdFlags {
    pub fn from_array(flags: [bool; 7]) -> Self {
        Self(flags)
    }

    pub fn as_array(&self) -> [bool; 7] {
        self.0
    }

    /// Flag for threshold `n`; `false` for values not in `THRESHOLDS`
    pub fn reached(&self, n: u32) -> bool {
        THRESHOLDS
            .iter()
            .position(|&t| t == n)
            .map(|i| self.0[i])
            .unwrap_or(false)
    }

    pub fn reached_x2(&self) -> bool {
        self.0[0]
    }

    /// OR-accumulate: a flag already set stays set, otherwise it is set when
    /// `multiple >= N`
    pub fn accumulate(&self, multiple: f64) -> Self {
        let mut next = self.0;
        for (flag, &threshold) in next.iter_mut().zip(THRESHOLDS.iter()) {
            *flag = *flag || multiple >= threshold as f64;
        }
        Self(next)
    }

    /// Highest threshold reached, if any
    pub fn highest(&self) -> Option<u32> {
        THRESHOLDS
            .iter()
            .zip(self.0.iter())
            .filter(|(_, hit)| **hit)
            .map(|(t, _)| *t)
            .last()
    }
}

/// Structured signal handed over by the chat listener
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSignal {
    pub contract_address: String,
    pub wallet_name: String,
    pub wallet_address: Option<String>,
    pub source_channel: String,
    pub symbol: Option<String>,
    pub signal_mc_usd: Option<f64>,
    pub signal_lq_usd: Option<f64>,
    pub seen_minutes: Option<i64>,
}

/// Derived UTC time fields, computed once from the detection timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFields {
    /// 0 = Monday … 6 = Sunday
    pub day_of_week: u32,
    pub hour_of_day: u32,
    /// ISO week number
    pub week_number: u32,
    pub month: u32,
}

/// Signal record as created at detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub contract_address: String,
    pub symbol: Option<String>,
    pub first_detected_at: i64,
    pub wallet_name: String,
    pub wallet_address: Option<String>,
    pub source_channel: String,

    pub signal_mc_usd: Option<f64>,
    pub signal_lq_usd: Option<f64>,
    pub seen_minutes: Option<i64>,

    pub api_mc_usd: Option<f64>,
    pub api_liquidity_usd: Option<f64>,
    pub api_price_usd: Option<f64>,
    pub holders: Option<i64>,
    pub txns_buys: Option<i64>,
    pub txns_sells: Option<i64>,
    pub platform: Option<String>,
    pub ath_market_cap: Option<f64>,
    pub reference_price_usd: Option<f64>,

    pub time: TimeFields,

    pub ath_ratio: Option<f64>,
    pub is_excluded: bool,
}

/// Record due for a checkpoint, as selected by the scheduler
#[derive(Debug, Clone, PartialEq)]
pub struct DueRecord {
    pub contract_address: String,
    pub symbol: Option<String>,
    pub wallet_name: String,
    pub first_detected_at: i64,
    pub baseline_mc_usd: Option<f64>,
}

impl DueRecord {
    pub fn display_symbol(&self) -> &str {
        self.symbol.as_deref().unwrap_or("???")
    }
}

/// Stored state the recorder folds a snapshot into
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredOutcome {
    pub baseline_mc_usd: Option<f64>,
    pub ath_at_detection: Option<f64>,
    /// `None` until the first checkpoint is recorded
    pub best_ath_ever: Option<f64>,
    pub true_multiple: Option<f64>,
    pub flags: ThresholdFlags,
}

/// Result of one recorder fold, returned for logging
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeSummary {
    pub previous_best_ath: f64,
    pub best_ath_ever: f64,
    pub previous_multiple: f64,
    pub true_multiple: f64,
    pub flags: ThresholdFlags,
}

/// Denormalized per-wallet leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSummary {
    pub wallet_name: String,
    pub wallet_address: Option<String>,
    pub total_signals: i64,
    pub total_x2: i64,
    /// Percentage, 0-100
    pub winrate: f64,
    pub last_updated: i64,
}

/// One row of `reference_price_history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePricePoint {
    pub timestamp: i64,
    pub price_usd: f64,
    /// Hour bucket, e.g. `2023-11-14 22:00`
    pub period_label: String,
}

/// Per-record projection used by the statistics aggregator and the
/// leaderboard (records whose terminal checkpoint is recorded)
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRow {
    pub contract_address: String,
    pub wallet_name: String,
    pub wallet_address: Option<String>,
    pub platform: Option<String>,
    pub day_of_week: u32,
    pub hour_of_day: u32,
    pub reference_price_usd: Option<f64>,
    pub is_excluded: bool,
    pub true_multiple: f64,
    pub flags: ThresholdFlags,
}
