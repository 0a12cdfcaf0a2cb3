//! # Checkpoint Outcome Tracker
//!
//! Tracks what happened to every trading signal after it was called, by
//! sampling the token's market state at 7 fixed offsets after detection
//! (5min, 20min, 1h, 3h, 6h, 24h, 7d) and folding each sample into a
//! running, never-decreasing outcome summary.
//!
//! ## Flow
//!
//! ```text
//! NewSignal → SignalRegistrar → signal_records (baseline + exclusion, fixed forever)
//!
//! check_outcomes
//!     ↓
//! OutcomeEngine::run_checkpoint / run_all
//!     ↓ scheduler: old enough AND no sample for this checkpoint
//!     ↓ provider:  token + ATH (concurrent, best-effort)
//!     ↓ recorder:  fold + persist (one transaction)
//!     ↓
//! refresh_wallet_leaderboard → wallet_stats
//! StatsAggregator → render_report → stdout
//! ```
//!
//! ## Invariants
//!
//! - One record per contract address; baseline and exclusion set only at creation
//! - A checkpoint sample is written at most once per record
//! - `best_ath_ever` and `true_multiple` never decrease
//! - Threshold flags only go false → true
//!
//! ## Schema Reference
//!
//! Migrations live in `/sql/` and are applied by `db::run_schema_migrations`:
//! - `signal_records` → `SignalRecord` + running summary
//! - `checkpoint_samples` → `MarketSnapshot` per (address, checkpoint)
//! - `wallet_stats` → `WalletSummary`
//! - `reference_price_history`
//!
//! ## Module Organization
//!
//! - `types` - Core data structures (Checkpoint, MarketSnapshot, SignalRecord)
//! - `db` - `SignalStore` trait and SQLite implementation
//! - `classifier` - One-time inclusion/exclusion decision
//! - `scheduler` - Due-record selection per checkpoint
//! - `recorder` - Monotonic outcome fold
//! - `engine` - Checkpoint pass orchestration
//! - `stats` / `report` - Aggregated breakdowns and their rendering
//! - `leaderboard` - Wallet summary recompute
//! - `ingestion` - Signal registration
//! - `provider` / `solana_tracker` - Market data
//! - `price_cache` - Reference price with TTL

pub mod classifier;
pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod leaderboard;
pub mod price_cache;
pub mod provider;
pub mod recorder;
pub mod report;
pub mod scheduler;
pub mod solana_tracker;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use classifier::{classify, Classification};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TrackerConfig;
pub use db::{SignalStore, SqliteSignalStore};
pub use engine::{OutcomeEngine, PassSummary};
pub use error::TrackerError;
pub use ingestion::{RegisterOutcome, SignalRegistrar};
pub use leaderboard::refresh_wallet_leaderboard;
pub use price_cache::ReferencePriceCache;
pub use provider::{MarketDataProvider, PoolReading, TokenReading};
pub use recorder::{fold_outcome, OutcomeRecorder};
pub use report::render_report;
pub use solana_tracker::SolanaTrackerClient;
pub use stats::{StatsAggregator, StatsReport};
pub use types::{
    Checkpoint, MarketSnapshot, NewSignal, OutcomeRow, ReferencePricePoint, SignalRecord,
    ThresholdFlags, WalletSummary,
};
