//! Outcome engine - orchestrates checkpoint passes
//!
//! ## Flow
//!
//! ```text
//! Scheduler(checkpoint)
//!     ↓ due records (oldest first)
//! for each record, sequentially:
//!     Provider: token + ATH (concurrent)
//!     ↓
//!     Recorder: fold + persist (one transaction)
//!     ↓
//!     sleep(record_delay)
//!     ↓
//! PassSummary
//! ```
//!
//! One record's failure never aborts the pass. A record without a usable
//! baseline market cap is skipped without writing, so it is offered again on
//! the next run.

use super::clock::Clock;
use super::db::SignalStore;
use super::error::TrackerError;
use super::leaderboard::refresh_wallet_leaderboard;
use super::provider::{sample_market, MarketDataProvider};
use super::recorder::OutcomeRecorder;
use super::scheduler;
use super::types::{Checkpoint, DueRecord, WalletSummary};
use std::sync::Arc;
use std::time::Duration;

/// Counters for one checkpoint pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub checkpoint: Checkpoint,
    pub due: usize,
    pub recorded: usize,
    /// No baseline market cap; left for a later run
    pub skipped: usize,
    /// Write failed; left for a later run
    pub failed: usize,
}

impl PassSummary {
    fn new(checkpoint: Checkpoint, due: usize) -> Self {
        Self {
            checkpoint,
            due,
            recorded: 0,
            skipped: 0,
            failed: 0,
        }
    }
}

enum RecordResult {
    Recorded,
    Skipped,
    Failed,
}

pub struct OutcomeEngine {
    store: Arc<dyn SignalStore>,
    provider: Arc<dyn MarketDataProvider>,
    recorder: OutcomeRecorder,
    clock: Arc<dyn Clock>,
    record_delay: Duration,
}

impl OutcomeEngine {
    pub fn new(
        store: Arc<dyn SignalStore>,
        provider: Arc<dyn MarketDataProvider>,
        clock: Arc<dyn Clock>,
        record_delay: Duration,
    ) -> Self {
        Self {
            recorder: OutcomeRecorder::new(store.clone()),
            store,
            provider,
            clock,
            record_delay,
        }
    }

    /// Run one pass for the named checkpoint
    ///
    /// Fails only on an invalid name or when the due list cannot be read.
    pub async fn run_checkpoint(&self, name: &str) -> Result<PassSummary, TrackerError> {
        let (checkpoint, due) =
            scheduler::due_records(self.store.as_ref(), name, self.clock.now_ts()).await?;
        Ok(self.run_pass(checkpoint, due).await)
    }

    /// Run every checkpoint in ascending offset order
    pub async fn run_all(&self) -> Result<Vec<PassSummary>, TrackerError> {
        let mut summaries = Vec::with_capacity(Checkpoint::ALL.len());
        for checkpoint in Checkpoint::ALL {
            let due =
                scheduler::due_for(self.store.as_ref(), checkpoint, self.clock.now_ts()).await?;
            summaries.push(self.run_pass(checkpoint, due).await);
        }
        Ok(summaries)
    }

    /// Recompute the wallet leaderboard from completed records
    pub async fn refresh_leaderboard(&self) -> Result<Vec<WalletSummary>, TrackerError> {
        refresh_wallet_leaderboard(self.store.as_ref(), self.clock.now_ts()).await
    }

    async fn run_pass(&self, checkpoint: Checkpoint, due: Vec<DueRecord>) -> PassSummary {
        let mut summary = PassSummary::new(checkpoint, due.len());

        if due.is_empty() {
            log::info!("✅ {}: nothing due", checkpoint.label());
            return summary;
        }

        log::info!("🔄 {}: {} record(s) due", checkpoint.label(), due.len());

        for (i, record) in due.iter().enumerate() {
            log::info!(
                "   [{}/{}] {} ({}...)",
                i + 1,
                due.len(),
                record.display_symbol(),
                record.contract_address.get(..8).unwrap_or(record.contract_address.as_str())
            );

            match self.process_record(checkpoint, record).await {
                RecordResult::Recorded => summary.recorded += 1,
                RecordResult::Skipped => summary.skipped += 1,
                RecordResult::Failed => summary.failed += 1,
            }

            if i + 1 < due.len() && !self.record_delay.is_zero() {
                tokio::time::sleep(self.record_delay).await;
            }
        }

        log::info!(
            "✅ {} done: {} recorded, {} skipped, {} failed",
            checkpoint.label(),
            summary.recorded,
            summary.skipped,
            summary.failed
        );

        summary
    }

    async fn process_record(&self, checkpoint: Checkpoint, record: &DueRecord) -> RecordResult {
        let baseline = match record.baseline_mc_usd {
            Some(mc) if mc > 0.0 => mc,
            _ => {
                log::warn!(
                    "   ├─ ⚠️  {} has no baseline market cap, skipping",
                    record.display_symbol()
                );
                return RecordResult::Skipped;
            }
        };

        let snapshot = sample_market(self.provider.as_ref(), &record.contract_address).await;
        if snapshot.is_empty() {
            log::warn!(
                "   ├─ ⚠️  {} returned no market data (delisted?)",
                record.display_symbol()
            );
        }

        match self
            .recorder
            .record(&record.contract_address, checkpoint, &snapshot, self.clock.now_ts())
            .await
        {
            Ok(outcome) => {
                log::info!(
                    "   ├─ {} | {} | MC ${:.0} → ${:.0} | ATH ${:.0} → ${:.0} | {:.2}x | holders {}",
                    record.display_symbol(),
                    record.wallet_name,
                    baseline,
                    snapshot.market_cap_usd,
                    outcome.previous_best_ath,
                    outcome.best_ath_ever,
                    outcome.true_multiple,
                    snapshot
                        .holders
                        .map(|h| h.to_string())
                        .unwrap_or_else(|| "?".to_string())
                );
                if let Some(top) = outcome.flags.highest() {
                    log::debug!("   │  reached {}x", top);
                }
                RecordResult::Recorded
            }
            Err(e) => {
                log::error!(
                    "   ├─ ❌ Failed to record {} for {}: {}",
                    checkpoint,
                    record.contract_address,
                    e
                );
                RecordResult::Failed
            }
        }
    }
}
