//! Outcome recorder
//!
//! Folds a new market snapshot into a record's running outcome summary.
//! The fold itself (`fold_outcome`) is pure; `OutcomeRecorder` runs it inside
//! the store's atomic checkpoint write.
//!
//! Guarantees per record, across any sequence of calls:
//! - `best_ath_ever` and `true_multiple` never decrease
//! - threshold flags only go false → true
//! - the raw per-checkpoint sample is stored as fetched (not monotonic)

use super::db::SignalStore;
use super::error::TrackerError;
use super::types::{Checkpoint, MarketSnapshot, OutcomeSummary, StoredOutcome};
use std::sync::Arc;

/// Fold one snapshot into the stored outcome
///
/// 1. stored best defaults to ATH-at-detection (first checkpoint), stored
///    multiple to 0
/// 2. candidate best = max(stored best, snapshot ATH, snapshot market cap)
/// 3. candidate multiple = candidate best ÷ baseline (0 without a baseline)
/// 4. new multiple = max(candidate, stored multiple)
/// 5. flags OR-accumulate against the new multiple
pub fn fold_outcome(stored: &StoredOutcome, snapshot: &MarketSnapshot) -> OutcomeSummary {
    let previous_best_ath = stored
        .best_ath_ever
        .or(stored.ath_at_detection)
        .unwrap_or(0.0)
        .max(0.0);
    let previous_multiple = stored.true_multiple.unwrap_or(0.0).max(0.0);

    let best_ath_ever = previous_best_ath
        .max(snapshot.ath_market_cap)
        .max(snapshot.market_cap_usd);

    let candidate_multiple = match stored.baseline_mc_usd {
        Some(baseline) if baseline > 0.0 => best_ath_ever / baseline,
        _ => 0.0,
    };

    let true_multiple = candidate_multiple.max(previous_multiple);

    OutcomeSummary {
        previous_best_ath,
        best_ath_ever,
        previous_multiple,
        true_multiple,
        flags: stored.flags.accumulate(true_multiple),
    }
}

/// Persists checkpoint samples through the store's atomic write
pub struct OutcomeRecorder {
    store: Arc<dyn SignalStore>,
}

impl OutcomeRecorder {
    pub fn new(store: Arc<dyn SignalStore>) -> Self {
        Self { store }
    }

    /// Record `snapshot` as the `checkpoint` sample of `address`
    ///
    /// An empty snapshot (delisted token, failed fetch) is still written: it
    /// cannot lower the summary, and the checkpoint counts as sampled.
    pub async fn record(
        &self,
        address: &str,
        checkpoint: Checkpoint,
        snapshot: &MarketSnapshot,
        recorded_at: i64,
    ) -> Result<OutcomeSummary, TrackerError> {
        let fold = |stored: &StoredOutcome| fold_outcome(stored, snapshot);
        self.store
            .record_checkpoint(address, checkpoint, snapshot, recorded_at, &fold)
            .await
    }
}
