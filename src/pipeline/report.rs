//! Human-readable statistics report

use super::stats::{GroupStats, StatsReport, HOUR_BAND, PRICE_BAND_USD};
use std::fmt::Write;

/// Wallets listed in the report
pub const MAX_REPORT_WALLETS: usize = 15;

/// Platform names longer than this are truncated
pub const PLATFORM_NAME_WIDTH: usize = 20;

pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const RULE_WIDTH: usize = 70;

/// `00h-04h`
pub fn hour_band_label(start: u32) -> String {
    format!("{:02}h-{:02}h", start, start + HOUR_BAND)
}

/// `$150-155`
pub fn price_band_label(lower: i64) -> String {
    format!("${}-{}", lower, lower.saturating_add(PRICE_BAND_USD as i64))
}

/// Platform name cut to `PLATFORM_NAME_WIDTH` characters, with an ellipsis
pub fn platform_label(name: &str) -> String {
    if name.chars().count() > PLATFORM_NAME_WIDTH {
        let head: String = name.chars().take(PLATFORM_NAME_WIDTH).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

fn group_line(stats: &GroupStats) -> String {
    format!("{:5.1}% winrate ({} calls)", stats.win_rate(), stats.total)
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
}

/// Render every breakdown
///
/// Sections with no data are omitted, except the global counters.
pub fn render_report(report: &StatsReport) -> String {
    let mut out = String::new();
    let global = &report.global;

    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "📊 OUTCOME REPORT");
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "✅ {} records checked at T+7d (of {} tracked)",
        global.checked, global.total_records
    );
    let _ = writeln!(out, "⚠️  {} excluded (ath_ratio < 0.5)", global.excluded);
    let _ = writeln!(out, "📋 {} included in the analysis", global.included);

    if global.included > 0 {
        let _ = writeln!(out);
        for n in [2, 5, 10] {
            let _ = writeln!(
                out,
                "📊 Winrate x{:<3}: {:5.1}% ({} calls)",
                n,
                global.hit_rate(n),
                global.hits(n)
            );
        }
    }

    if !report.wallets.is_empty() {
        section(
            &mut out,
            &format!("🏆 BY WALLET (min {} calls)", report.min_wallet_signals),
        );
        for wallet in report.wallets.iter().take(MAX_REPORT_WALLETS) {
            let _ = writeln!(
                out,
                "  {:15} : {:5.1}% winrate | {:3} calls | {}",
                wallet.wallet_name,
                wallet.stats.win_rate(),
                wallet.stats.total,
                wallet.dominant_platform.as_deref().unwrap_or("?")
            );
        }
    }

    if !report.by_day.is_empty() {
        section(&mut out, "📅 BY DAY (UTC)");
        for (day, name) in DAY_NAMES.iter().enumerate() {
            match report.by_day.get(&(day as u32)) {
                Some(stats) => {
                    let _ = writeln!(out, "  {:10} : {}", name, group_line(stats));
                }
                None => {
                    let _ = writeln!(out, "  {:10} : - (0 calls)", name);
                }
            }
        }
    }

    if !report.by_hour.is_empty() {
        section(&mut out, "⏰ BY HOUR BAND (UTC)");
        for (start, stats) in &report.by_hour {
            let _ = writeln!(out, "  {} : {}", hour_band_label(*start), group_line(stats));
        }
    }

    if !report.by_platform.is_empty() {
        section(&mut out, "🏭 BY PLATFORM");
        for (name, stats) in &report.by_platform {
            let _ = writeln!(out, "  {:20} : {}", platform_label(name), group_line(stats));
        }
    }

    if !report.by_price.is_empty() {
        section(&mut out, "💰 BY REFERENCE PRICE");
        for (lower, stats) in &report.by_price {
            let _ = writeln!(out, "  {:10} : {}", price_band_label(*lower), group_line(stats));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stats::{GlobalStats, StatsAggregator, WalletStats};
    use crate::pipeline::types::{OutcomeRow, ThresholdFlags};

    #[test]
    fn test_labels() {
        assert_eq!(hour_band_label(0), "00h-04h");
        assert_eq!(hour_band_label(20), "20h-24h");
        assert_eq!(price_band_label(150), "$150-155");
        assert_eq!(
            price_band_label(i64::MAX),
            format!("${}-{}", i64::MAX, i64::MAX)
        );
        assert_eq!(platform_label("pump.fun"), "pump.fun");
        assert_eq!(
            platform_label("https://some-very-long-launchpad.io"),
            "https://some-very-lo..."
        );
    }

    #[test]
    fn test_empty_report_has_only_global_section() {
        let text = render_report(&StatsReport::default());
        assert!(text.contains("0 records checked at T+7d (of 0 tracked)"));
        assert!(!text.contains("BY WALLET"));
        assert!(!text.contains("Winrate x2"));
    }

    #[test]
    fn test_report_sections() {
        let mut report = StatsReport {
            global: GlobalStats {
                total_records: 10,
                checked: 8,
                excluded: 2,
                included: 6,
                threshold_hits: [3, 2, 1, 0, 0, 0, 0],
            },
            min_wallet_signals: 3,
            ..Default::default()
        };
        report.wallets = (0..20)
            .map(|i| WalletStats {
                wallet_name: format!("wallet{:02}", i),
                wallet_address: None,
                stats: GroupStats { total: 3, x2_hits: 1 },
                dominant_platform: Some("pump.fun".to_string()),
            })
            .collect();
        report.by_day.insert(1, GroupStats { total: 4, x2_hits: 2 });
        report.by_hour.insert(8, GroupStats { total: 4, x2_hits: 1 });
        report.by_price.insert(150, GroupStats { total: 6, x2_hits: 3 });

        let text = render_report(&report);

        assert!(text.contains("Winrate x2  :  50.0% (3 calls)"));
        assert!(text.contains("BY WALLET (min 3 calls)"));
        assert!(text.contains("wallet14"));
        assert!(!text.contains("wallet15"));
        assert!(text.contains("Tuesday    :  50.0% winrate (4 calls)"));
        assert!(text.contains("Monday     : - (0 calls)"));
        assert!(text.contains("08h-12h :  25.0% winrate (4 calls)"));
        assert!(text.contains("$150-155   :  50.0% winrate (6 calls)"));
        assert!(!text.contains("BY PLATFORM"));
    }

    #[test]
    fn test_wallet_heading_uses_threshold() {
        let mut report = StatsReport {
            min_wallet_signals: 5,
            ..Default::default()
        };
        report.wallets.push(WalletStats {
            wallet_name: "alpha".to_string(),
            wallet_address: None,
            stats: GroupStats { total: 5, x2_hits: 2 },
            dominant_platform: None,
        });

        let text = render_report(&report);
        assert!(text.contains("🏆 BY WALLET (min 5 calls)"));
    }

    #[test]
    fn test_absurd_reference_price_still_renders() {
        let rows = vec![OutcomeRow {
            contract_address: "Mint111".to_string(),
            wallet_name: "alpha".to_string(),
            wallet_address: None,
            platform: None,
            day_of_week: 0,
            hour_of_day: 0,
            reference_price_usd: Some(1e30),
            is_excluded: false,
            true_multiple: 2.0,
            flags: ThresholdFlags::default().accumulate(2.0),
        }];
        let report = StatsAggregator::new(1).aggregate(1, &rows);
        assert!(report.by_price.is_empty());

        let text = render_report(&report);
        assert!(text.contains("1 records checked at T+7d (of 1 tracked)"));
        assert!(!text.contains("BY REFERENCE PRICE"));
    }
}
