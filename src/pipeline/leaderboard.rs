//! Wallet leaderboard updater
//!
//! Full recompute of `wallet_stats` from the included, completed records.
//! Completion and exclusion never change once set, so the set of wallets
//! only grows and an upsert per wallet replaces the whole table's contents.

use super::db::SignalStore;
use super::error::TrackerError;
use super::stats::tally_wallets;
use super::types::WalletSummary;

/// Recompute and persist every wallet summary
///
/// Returns the summaries ordered by win rate, highest first.
pub async fn refresh_wallet_leaderboard(
    store: &dyn SignalStore,
    now: i64,
) -> Result<Vec<WalletSummary>, TrackerError> {
    let rows = store.load_completed_rows().await?;

    let mut summaries: Vec<WalletSummary> = tally_wallets(&rows)
        .into_iter()
        .map(|(wallet_name, tally)| WalletSummary {
            wallet_name,
            wallet_address: tally.wallet_address,
            total_signals: tally.stats.total as i64,
            total_x2: tally.stats.x2_hits as i64,
            winrate: tally.stats.win_rate(),
            last_updated: now,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.winrate
            .total_cmp(&a.winrate)
            .then_with(|| b.total_signals.cmp(&a.total_signals))
            .then_with(|| a.wallet_name.cmp(&b.wallet_name))
    });

    for summary in &summaries {
        store.upsert_wallet_summary(summary).await?;
    }

    log::info!("🏆 Wallet leaderboard refreshed ({} wallets)", summaries.len());
    Ok(summaries)
}
