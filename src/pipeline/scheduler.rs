//! Checkpoint scheduler
//!
//! Selection is driven by the stored samples themselves: a record is due for
//! a checkpoint when it is old enough and has no sample for it yet. Writing
//! the sample is what removes it from every later selection, so there is no
//! separate "processed" bookkeeping. There is no upper bound on how overdue a
//! record may be; a missed run is caught up on the next one.

use super::db::SignalStore;
use super::error::TrackerError;
use super::types::{Checkpoint, DueRecord};

/// Detection cutoff for `checkpoint` at time `now`
///
/// A record is old enough when `now - first_detected_at >= min_age`.
pub fn detection_cutoff(checkpoint: Checkpoint, now: i64) -> i64 {
    now - checkpoint.min_age_secs()
}

/// The named checkpoint and its due records, oldest detection first
///
/// Fails with `InvalidCheckpoint` before touching the store when `name` is
/// not one of the fixed checkpoint names.
pub async fn due_records(
    store: &dyn SignalStore,
    name: &str,
    now: i64,
) -> Result<(Checkpoint, Vec<DueRecord>), TrackerError> {
    let checkpoint: Checkpoint = name.parse()?;
    let due = due_for(store, checkpoint, now).await?;
    Ok((checkpoint, due))
}

pub async fn due_for(
    store: &dyn SignalStore,
    checkpoint: Checkpoint,
    now: i64,
) -> Result<Vec<DueRecord>, TrackerError> {
    let due = store
        .due_for_checkpoint(checkpoint, detection_cutoff(checkpoint, now))
        .await?;

    log::debug!("⏰ {} due for {}", due.len(), checkpoint.label());
    Ok(due)
}
