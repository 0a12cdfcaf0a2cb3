//! Statistics aggregator
//!
//! Read-only breakdowns over completed records (terminal checkpoint sampled).
//! Every breakdown except the global counters is restricted to included
//! records. Win rate for a group is the share of its records whose true
//! multiple reached 2x.

use super::types::{OutcomeRow, THRESHOLDS};
use std::collections::{BTreeMap, HashMap};

/// Width of an hour-of-day band
pub const HOUR_BAND: u32 = 4;

/// Width of a reference-price band, in USD
pub const PRICE_BAND_USD: f64 = 5.0;

/// Map a raw platform string onto the canonical platform names
///
/// Unmapped values pass through verbatim; missing ones become `unknown`.
pub fn normalize_platform(raw: Option<&str>) -> String {
    let raw = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return "unknown".to_string(),
    };

    if raw.contains("pump.fun") {
        "pump.fun".to_string()
    } else if raw.to_lowercase().contains("bonk") {
        "letsbonk".to_string()
    } else {
        raw.to_string()
    }
}

/// Start of the 4-hour band containing `hour`
pub fn hour_band(hour: u32) -> u32 {
    (hour / HOUR_BAND) * HOUR_BAND
}

/// Lower bound of the $5 band containing `price`
///
/// `None` for prices that are not finite, negative, or too large for a band.
pub fn price_band(price: f64) -> Option<i64> {
    if !price.is_finite() || price < 0.0 {
        return None;
    }
    let lower = (price / PRICE_BAND_USD).floor() * PRICE_BAND_USD;
    if lower + PRICE_BAND_USD >= i64::MAX as f64 {
        return None;
    }
    Some(lower as i64)
}

/// Count and 2x hits of one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupStats {
    pub total: usize,
    pub x2_hits: usize,
}

impl GroupStats {
    fn add(&mut self, row: &OutcomeRow) {
        self.total += 1;
        if row.flags.reached_x2() {
            self.x2_hits += 1;
        }
    }

    /// Win rate as a percentage (0 for an empty group)
    pub fn win_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.x2_hits as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalStats {
    /// Every record, complete or not
    pub total_records: i64,
    /// Records with the terminal checkpoint sampled
    pub checked: usize,
    /// Checked records flagged as excluded
    pub excluded: usize,
    /// Checked records counted in the analysis
    pub included: usize,
    /// Included records per threshold, aligned with `THRESHOLDS`
    pub threshold_hits: [usize; 7],
}

impl GlobalStats {
    /// Included records that reached `n`x (0 for untracked thresholds)
    pub fn hits(&self, n: u32) -> usize {
        THRESHOLDS
            .iter()
            .position(|&t| t == n)
            .map(|i| self.threshold_hits[i])
            .unwrap_or(0)
    }

    /// Percentage of included records that reached `n`x
    pub fn hit_rate(&self, n: u32) -> f64 {
        if self.included == 0 {
            0.0
        } else {
            self.hits(n) as f64 / self.included as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalletStats {
    pub wallet_name: String,
    pub wallet_address: Option<String>,
    pub stats: GroupStats,
    /// Most frequent normalized platform among the wallet's records
    pub dominant_platform: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsReport {
    pub global: GlobalStats,
    /// Sorted by win rate, highest first
    pub wallets: Vec<WalletStats>,
    /// Keyed by day of week (0 = Monday)
    pub by_day: BTreeMap<u32, GroupStats>,
    /// Keyed by band start hour
    pub by_hour: BTreeMap<u32, GroupStats>,
    /// Sorted by win rate, highest first
    pub by_platform: Vec<(String, GroupStats)>,
    /// Keyed by band lower bound in USD; only populated bands appear
    pub by_price: BTreeMap<i64, GroupStats>,
    /// Minimum included calls for a wallet to be listed
    pub min_wallet_signals: usize,
}

/// Per-wallet accumulator shared with the leaderboard
#[derive(Debug, Default)]
pub(crate) struct WalletTally {
    pub wallet_address: Option<String>,
    pub stats: GroupStats,
    pub platforms: HashMap<String, usize>,
}

impl WalletTally {
    fn dominant_platform(&self) -> Option<String> {
        self.platforms
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, _)| name.clone())
    }
}

/// Group included rows by wallet identity
pub(crate) fn tally_wallets<'a, I>(rows: I) -> HashMap<String, WalletTally>
where
    I: IntoIterator<Item = &'a OutcomeRow>,
{
    let mut wallets: HashMap<String, WalletTally> = HashMap::new();
    for row in rows.into_iter().filter(|r| !r.is_excluded) {
        let tally = wallets.entry(row.wallet_name.clone()).or_default();
        tally.stats.add(row);
        if tally.wallet_address.is_none() {
            tally.wallet_address = row.wallet_address.clone();
        }
        *tally
            .platforms
            .entry(normalize_platform(row.platform.as_deref()))
            .or_insert(0) += 1;
    }
    wallets
}

fn by_win_rate(a: &GroupStats, b: &GroupStats) -> std::cmp::Ordering {
    b.win_rate()
        .total_cmp(&a.win_rate())
        .then_with(|| b.total.cmp(&a.total))
}

pub struct StatsAggregator {
    min_wallet_signals: usize,
}

impl StatsAggregator {
    pub fn new(min_wallet_signals: usize) -> Self {
        Self { min_wallet_signals }
    }

    /// Build every breakdown from the completed rows
    ///
    /// `total_records` is the size of the whole record set, including
    /// records still waiting for their terminal checkpoint.
    pub fn aggregate(&self, total_records: i64, rows: &[OutcomeRow]) -> StatsReport {
        let mut report = StatsReport {
            global: GlobalStats {
                total_records,
                checked: rows.len(),
                ..Default::default()
            },
            min_wallet_signals: self.min_wallet_signals,
            ..Default::default()
        };

        let mut platforms: HashMap<String, GroupStats> = HashMap::new();

        for row in rows {
            if row.is_excluded {
                report.global.excluded += 1;
                continue;
            }

            report.global.included += 1;
            for (hits, flag) in report
                .global
                .threshold_hits
                .iter_mut()
                .zip(row.flags.as_array())
            {
                if flag {
                    *hits += 1;
                }
            }

            report.by_day.entry(row.day_of_week).or_default().add(row);
            report
                .by_hour
                .entry(hour_band(row.hour_of_day))
                .or_default()
                .add(row);
            platforms
                .entry(normalize_platform(row.platform.as_deref()))
                .or_default()
                .add(row);
            if let Some(band) = row.reference_price_usd.and_then(price_band) {
                report.by_price.entry(band).or_default().add(row);
            }
        }

        let mut wallets: Vec<WalletStats> = tally_wallets(rows)
            .into_iter()
            .filter(|(_, tally)| tally.stats.total >= self.min_wallet_signals)
            .map(|(wallet_name, tally)| WalletStats {
                dominant_platform: tally.dominant_platform(),
                wallet_name,
                wallet_address: tally.wallet_address,
                stats: tally.stats,
            })
            .collect();
        wallets.sort_by(|a, b| {
            by_win_rate(&a.stats, &b.stats).then_with(|| a.wallet_name.cmp(&b.wallet_name))
        });
        report.wallets = wallets;

        let mut platforms: Vec<(String, GroupStats)> = platforms.into_iter().collect();
        platforms.sort_by(|a, b| by_win_rate(&a.1, &b.1).then_with(|| a.0.cmp(&b.0)));
        report.by_platform = platforms;

        report
    }
}
