//! SQLite persistence for signal records, checkpoint samples and wallet stats
//!
//! Schema lives in `/sql/*.sql` and is embedded as an ordered, versioned
//! migration list. Each migration is applied once and recorded in
//! `schema_migrations`, so opening a store is idempotent.

use super::error::TrackerError;
use super::types::{
    Checkpoint, DueRecord, MarketSnapshot, OutcomeRow, OutcomeSummary, ReferencePricePoint,
    SignalRecord, StoredOutcome, ThresholdFlags, TimeFields, WalletSummary,
};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Embedded schema migration
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// All migrations, ascending by version
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "signal_records",
        sql: include_str!("../../sql/01_signal_records.sql"),
    },
    Migration {
        version: 2,
        name: "checkpoint_samples",
        sql: include_str!("../../sql/02_checkpoint_samples.sql"),
    },
    Migration {
        version: 3,
        name: "wallet_stats",
        sql: include_str!("../../sql/03_wallet_stats.sql"),
    },
    Migration {
        version: 4,
        name: "reference_price_history",
        sql: include_str!("../../sql/04_reference_price_history.sql"),
    },
];

/// Apply pending migrations in version order
///
/// Returns the number of migrations applied by this call.
pub fn run_schema_migrations(conn: &mut Connection) -> Result<usize, TrackerError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL
        )
        "#,
    )?;

    let current: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        log::info!("   ├─ Applying migration {:02}: {}", migration.version, migration.name);

        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, chrono::Utc::now().timestamp()],
        )?;
        tx.commit()?;

        applied += 1;
    }

    if applied > 0 {
        log::info!("✅ Applied {} schema migration(s)", applied);
    } else {
        log::debug!("✅ Database schema is up to date (version {})", current);
    }

    Ok(applied)
}

/// Fold applied to a record's stored outcome inside the checkpoint write
pub type OutcomeFold<'a> = &'a (dyn Fn(&StoredOutcome) -> OutcomeSummary + Send + Sync);

/// Persistence capability used by the tracker
///
/// Every method is one short-lived operation; no multi-record transactions.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Insert a new record; returns `false` if the address already exists
    async fn insert_signal(&self, record: &SignalRecord) -> Result<bool, TrackerError>;

    async fn signal_exists(&self, address: &str) -> Result<bool, TrackerError>;

    async fn load_signal(&self, address: &str) -> Result<Option<SignalRecord>, TrackerError>;

    /// Records detected at or before `detected_before` with no sample for `checkpoint`
    async fn due_for_checkpoint(
        &self,
        checkpoint: Checkpoint,
        detected_before: i64,
    ) -> Result<Vec<DueRecord>, TrackerError>;

    /// Atomic read-modify-write of one record for one checkpoint
    ///
    /// Reads the stored outcome, applies `fold`, inserts the raw sample and
    /// writes the new summary in a single transaction.
    async fn record_checkpoint(
        &self,
        address: &str,
        checkpoint: Checkpoint,
        sample: &MarketSnapshot,
        recorded_at: i64,
        fold: OutcomeFold<'_>,
    ) -> Result<OutcomeSummary, TrackerError>;

    async fn load_sample(
        &self,
        address: &str,
        checkpoint: Checkpoint,
    ) -> Result<Option<MarketSnapshot>, TrackerError>;

    async fn load_outcome(&self, address: &str) -> Result<Option<StoredOutcome>, TrackerError>;

    async fn count_signals(&self) -> Result<i64, TrackerError>;

    /// All records whose terminal checkpoint is recorded (excluded ones too)
    async fn load_completed_rows(&self) -> Result<Vec<OutcomeRow>, TrackerError>;

    async fn upsert_wallet_summary(&self, summary: &WalletSummary) -> Result<(), TrackerError>;

    /// Wallet summaries ordered by win rate, highest first
    async fn load_wallet_summaries(&self) -> Result<Vec<WalletSummary>, TrackerError>;

    async fn save_reference_price(
        &self,
        price_usd: f64,
        timestamp: i64,
        period_label: &str,
    ) -> Result<(), TrackerError>;

    /// Price history, oldest first
    async fn load_reference_prices(&self) -> Result<Vec<ReferencePricePoint>, TrackerError>;
}

/// SQLite implementation of `SignalStore`
pub struct SqliteSignalStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSignalStore {
    /// Open (or create) a database file and bring its schema up to date
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, TrackerError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(db_path)?;

        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("📊 SQLite journal mode: {}", mode);
        conn.pragma_update(None, "foreign_keys", "ON")?;

        run_schema_migrations(&mut conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database with schema applied
    pub fn open_in_memory() -> Result<Self, TrackerError> {
        let mut conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_schema_migrations(&mut conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TrackerError> {
        self.conn.lock().map_err(|_| TrackerError::LockPoisoned)
    }
}

const SIGNAL_COLUMNS: &str = r#"
    contract_address, symbol, first_detected_at, wallet_name, wallet_address, source_channel,
    signal_mc_usd, signal_lq_usd, seen_minutes,
    api_mc_usd, api_liquidity_usd, api_price_usd, holders, txns_buys, txns_sells,
    platform, ath_market_cap, reference_price_usd,
    day_of_week, hour_of_day, week_number, month,
    ath_ratio, is_excluded
"#;

const FLAG_COLUMNS: &str =
    "reached_x2, reached_x3, reached_x5, reached_x10, reached_x20, reached_x50, reached_x100";

fn signal_from_row(row: &Row<'_>) -> rusqlite::Result<SignalRecord> {
    Ok(SignalRecord {
        contract_address: row.get(0)?,
        symbol: row.get(1)?,
        first_detected_at: row.get(2)?,
        wallet_name: row.get(3)?,
        wallet_address: row.get(4)?,
        source_channel: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        signal_mc_usd: row.get(6)?,
        signal_lq_usd: row.get(7)?,
        seen_minutes: row.get(8)?,
        api_mc_usd: row.get(9)?,
        api_liquidity_usd: row.get(10)?,
        api_price_usd: row.get(11)?,
        holders: row.get(12)?,
        txns_buys: row.get(13)?,
        txns_sells: row.get(14)?,
        platform: row.get(15)?,
        ath_market_cap: row.get(16)?,
        reference_price_usd: row.get(17)?,
        time: TimeFields {
            day_of_week: row.get(18)?,
            hour_of_day: row.get(19)?,
            week_number: row.get(20)?,
            month: row.get(21)?,
        },
        ath_ratio: row.get(22)?,
        is_excluded: row.get(23)?,
    })
}

/// Read the 7 threshold flags starting at column `start`
fn flags_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<ThresholdFlags> {
    let mut flags = [false; 7];
    for (i, flag) in flags.iter_mut().enumerate() {
        *flag = row.get(start + i)?;
    }
    Ok(ThresholdFlags::from_array(flags))
}

fn outcome_from_row(row: &Row<'_>) -> rusqlite::Result<StoredOutcome> {
    Ok(StoredOutcome {
        baseline_mc_usd: row.get(0)?,
        ath_at_detection: row.get(1)?,
        best_ath_ever: row.get(2)?,
        true_multiple: row.get(3)?,
        flags: flags_from_row(row, 4)?,
    })
}

fn query_outcome(conn: &Connection, address: &str) -> rusqlite::Result<Option<StoredOutcome>> {
    conn.query_row(
        &format!(
            "SELECT api_mc_usd, ath_market_cap, best_ath_ever, true_multiple, {}
             FROM signal_records WHERE contract_address = ?1",
            FLAG_COLUMNS
        ),
        [address],
        outcome_from_row,
    )
    .optional()
}

#[async_trait]
impl SignalStore for SqliteSignalStore {
    async fn insert_signal(&self, record: &SignalRecord) -> Result<bool, TrackerError> {
        let conn = self.lock()?;

        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO signal_records ({}) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                    ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24
                )",
                SIGNAL_COLUMNS
            ),
            params![
                record.contract_address,
                record.symbol,
                record.first_detected_at,
                record.wallet_name,
                record.wallet_address,
                record.source_channel,
                record.signal_mc_usd,
                record.signal_lq_usd,
                record.seen_minutes,
                record.api_mc_usd,
                record.api_liquidity_usd,
                record.api_price_usd,
                record.holders,
                record.txns_buys,
                record.txns_sells,
                record.platform,
                record.ath_market_cap,
                record.reference_price_usd,
                record.time.day_of_week,
                record.time.hour_of_day,
                record.time.week_number,
                record.time.month,
                record.ath_ratio,
                record.is_excluded,
            ],
        )?;

        Ok(inserted > 0)
    }

    async fn signal_exists(&self, address: &str) -> Result<bool, TrackerError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT 1 FROM signal_records WHERE contract_address = ?1")?;
        Ok(stmt.exists([address])?)
    }

    async fn load_signal(&self, address: &str) -> Result<Option<SignalRecord>, TrackerError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM signal_records WHERE contract_address = ?1",
                    SIGNAL_COLUMNS
                ),
                [address],
                signal_from_row,
            )
            .optional()?;
        Ok(record)
    }

    async fn due_for_checkpoint(
        &self,
        checkpoint: Checkpoint,
        detected_before: i64,
    ) -> Result<Vec<DueRecord>, TrackerError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.contract_address, s.symbol, s.wallet_name, s.first_detected_at, s.api_mc_usd
            FROM signal_records s
            WHERE s.first_detected_at <= ?1
              AND NOT EXISTS (
                  SELECT 1 FROM checkpoint_samples c
                  WHERE c.contract_address = s.contract_address
                    AND c.checkpoint = ?2
              )
            ORDER BY s.first_detected_at ASC, s.contract_address ASC
            "#,
        )?;

        let rows = stmt.query_map(params![detected_before, checkpoint.as_str()], |row| {
            Ok(DueRecord {
                contract_address: row.get(0)?,
                symbol: row.get(1)?,
                wallet_name: row.get(2)?,
                first_detected_at: row.get(3)?,
                baseline_mc_usd: row.get(4)?,
            })
        })?;

        let mut due = Vec::new();
        for row in rows {
            due.push(row?);
        }
        Ok(due)
    }

    async fn record_checkpoint(
        &self,
        address: &str,
        checkpoint: Checkpoint,
        sample: &MarketSnapshot,
        recorded_at: i64,
        fold: OutcomeFold<'_>,
    ) -> Result<OutcomeSummary, TrackerError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let stored = query_outcome(&tx, address)?
            .ok_or_else(|| TrackerError::RecordNotFound(address.to_string()))?;

        let already: bool = tx
            .prepare(
                "SELECT 1 FROM checkpoint_samples WHERE contract_address = ?1 AND checkpoint = ?2",
            )?
            .exists(params![address, checkpoint.as_str()])?;
        if already {
            return Err(TrackerError::CheckpointAlreadyRecorded {
                address: address.to_string(),
                checkpoint: checkpoint.as_str().to_string(),
            });
        }

        let summary = fold(&stored);

        tx.execute(
            r#"
            INSERT INTO checkpoint_samples (
                contract_address, checkpoint, recorded_at,
                market_cap_usd, ath_market_cap, holders, liquidity_usd, price_usd,
                txns_buys, txns_sells
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                address,
                checkpoint.as_str(),
                recorded_at,
                sample.market_cap_usd,
                sample.ath_market_cap,
                sample.holders,
                sample.liquidity_usd,
                sample.price_usd,
                sample.buys,
                sample.sells,
            ],
        )?;

        let flags = summary.flags.as_array();
        tx.execute(
            r#"
            UPDATE signal_records SET
                best_ath_ever = ?2,
                true_multiple = ?3,
                reached_x2 = ?4,
                reached_x3 = ?5,
                reached_x5 = ?6,
                reached_x10 = ?7,
                reached_x20 = ?8,
                reached_x50 = ?9,
                reached_x100 = ?10
            WHERE contract_address = ?1
            "#,
            params![
                address,
                summary.best_ath_ever,
                summary.true_multiple,
                flags[0],
                flags[1],
                flags[2],
                flags[3],
                flags[4],
                flags[5],
                flags[6],
            ],
        )?;

        tx.commit()?;
        Ok(summary)
    }

    async fn load_sample(
        &self,
        address: &str,
        checkpoint: Checkpoint,
    ) -> Result<Option<MarketSnapshot>, TrackerError> {
        let conn = self.lock()?;
        let sample = conn
            .query_row(
                r#"
                SELECT market_cap_usd, ath_market_cap, holders, liquidity_usd, price_usd,
                       txns_buys, txns_sells
                FROM checkpoint_samples
                WHERE contract_address = ?1 AND checkpoint = ?2
                "#,
                params![address, checkpoint.as_str()],
                |row| {
                    Ok(MarketSnapshot {
                        market_cap_usd: row.get(0)?,
                        ath_market_cap: row.get(1)?,
                        holders: row.get(2)?,
                        liquidity_usd: row.get(3)?,
                        price_usd: row.get(4)?,
                        buys: row.get(5)?,
                        sells: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(sample)
    }

    async fn load_outcome(&self, address: &str) -> Result<Option<StoredOutcome>, TrackerError> {
        let conn = self.lock()?;
        Ok(query_outcome(&conn, address)?)
    }

    async fn count_signals(&self) -> Result<i64, TrackerError> {
        let conn = self.lock()?;
        let count = conn.query_row("SELECT COUNT(*) FROM signal_records", [], |row| row.get(0))?;
        Ok(count)
    }

    async fn load_completed_rows(&self) -> Result<Vec<OutcomeRow>, TrackerError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT s.contract_address, s.wallet_name, s.wallet_address, s.platform,
                   s.day_of_week, s.hour_of_day, s.reference_price_usd, s.is_excluded,
                   COALESCE(s.true_multiple, 0), {}
            FROM signal_records s
            JOIN checkpoint_samples c
              ON c.contract_address = s.contract_address AND c.checkpoint = ?1
            ORDER BY s.first_detected_at ASC
            "#,
            FLAG_COLUMNS
                .split(", ")
                .map(|col| format!("s.{}", col))
                .collect::<Vec<_>>()
                .join(", ")
        ))?;

        let rows = stmt.query_map([Checkpoint::TERMINAL.as_str()], |row| {
            Ok(OutcomeRow {
                contract_address: row.get(0)?,
                wallet_name: row.get(1)?,
                wallet_address: row.get(2)?,
                platform: row.get(3)?,
                day_of_week: row.get(4)?,
                hour_of_day: row.get(5)?,
                reference_price_usd: row.get(6)?,
                is_excluded: row.get(7)?,
                true_multiple: row.get(8)?,
                flags: flags_from_row(row, 9)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    async fn upsert_wallet_summary(&self, summary: &WalletSummary) -> Result<(), TrackerError> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO wallet_stats
                (wallet_name, wallet_address, total_signals, total_x2, winrate, last_updated)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(wallet_name) DO UPDATE SET
                wallet_address = excluded.wallet_address,
                total_signals = excluded.total_signals,
                total_x2 = excluded.total_x2,
                winrate = excluded.winrate,
                last_updated = excluded.last_updated
            "#,
            params![
                summary.wallet_name,
                summary.wallet_address,
                summary.total_signals,
                summary.total_x2,
                summary.winrate,
                summary.last_updated,
            ],
        )?;
        Ok(())
    }

    async fn load_wallet_summaries(&self) -> Result<Vec<WalletSummary>, TrackerError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT wallet_name, wallet_address, total_signals, total_x2, winrate, last_updated
            FROM wallet_stats
            ORDER BY winrate DESC, total_signals DESC, wallet_name ASC
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(WalletSummary {
                wallet_name: row.get(0)?,
                wallet_address: row.get(1)?,
                total_signals: row.get(2)?,
                total_x2: row.get(3)?,
                winrate: row.get(4)?,
                last_updated: row.get(5)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    async fn save_reference_price(
        &self,
        price_usd: f64,
        timestamp: i64,
        period_label: &str,
    ) -> Result<(), TrackerError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO reference_price_history (timestamp, price_usd, period_label)
             VALUES (?1, ?2, ?3)",
            params![timestamp, price_usd, period_label],
        )?;
        Ok(())
    }

    async fn load_reference_prices(&self) -> Result<Vec<ReferencePricePoint>, TrackerError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT timestamp, price_usd, period_label FROM reference_price_history
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ReferencePricePoint {
                timestamp: row.get(0)?,
                price_usd: row.get(1)?,
                period_label: row.get(2)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    /// Helper to build a minimal record
    fn make_record(address: &str, detected_at: i64, baseline: Option<f64>) -> SignalRecord {
        SignalRecord {
            contract_address: address.to_string(),
            symbol: Some("TEST".to_string()),
            first_detected_at: detected_at,
            wallet_name: "alpha".to_string(),
            wallet_address: None,
            source_channel: "MAIN".to_string(),
            signal_mc_usd: None,
            signal_lq_usd: None,
            seen_minutes: None,
            api_mc_usd: baseline,
            api_liquidity_usd: Some(5_000.0),
            api_price_usd: None,
            holders: Some(120),
            txns_buys: None,
            txns_sells: None,
            platform: Some("pump.fun".to_string()),
            ath_market_cap: Some(9_000.0),
            reference_price_usd: Some(152.0),
            time: TimeFields {
                day_of_week: 2,
                hour_of_day: 13,
                week_number: 46,
                month: 11,
            },
            ath_ratio: Some(1.11),
            is_excluded: false,
        }
    }

    fn fixed_fold(best: f64, multiple: f64) -> impl Fn(&StoredOutcome) -> OutcomeSummary + Send + Sync {
        move |stored: &StoredOutcome| OutcomeSummary {
            previous_best_ath: stored.best_ath_ever.unwrap_or(0.0),
            best_ath_ever: best,
            previous_multiple: stored.true_multiple.unwrap_or(0.0),
            true_multiple: multiple,
            flags: stored.flags.accumulate(multiple),
        }
    }

    #[test]
    fn test_migrations_idempotent() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut conn = Connection::open(temp_file.path()).unwrap();

        assert_eq!(run_schema_migrations(&mut conn).unwrap(), MIGRATIONS.len());
        assert_eq!(run_schema_migrations(&mut conn).unwrap(), 0);

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_migration_versions_ascending() {
        assert!(MIGRATIONS.windows(2).all(|w| w[0].version < w[1].version));
    }

    #[tokio::test]
    async fn test_insert_and_load_signal() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = SqliteSignalStore::open(temp_file.path()).unwrap();
        let record = make_record("mint_a", 1_700_000_000, Some(10_000.0));

        assert!(store.insert_signal(&record).await.unwrap());
        assert!(store.signal_exists("mint_a").await.unwrap());
        assert!(!store.signal_exists("mint_b").await.unwrap());

        let loaded = store.load_signal("mint_a").await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_duplicate_insert_ignored() {
        let store = SqliteSignalStore::open_in_memory().unwrap();
        let record = make_record("mint_dup", 1_700_000_000, Some(10_000.0));

        assert!(store.insert_signal(&record).await.unwrap());

        let mut changed = record.clone();
        changed.api_mc_usd = Some(1.0);
        changed.is_excluded = true;
        assert!(!store.insert_signal(&changed).await.unwrap());

        // Baseline and exclusion decision come from the first insert only
        let loaded = store.load_signal("mint_dup").await.unwrap().unwrap();
        assert_eq!(loaded.api_mc_usd, Some(10_000.0));
        assert!(!loaded.is_excluded);
        assert_eq!(store.count_signals().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_record_checkpoint_writes_sample_and_summary() {
        let store = SqliteSignalStore::open_in_memory().unwrap();
        store
            .insert_signal(&make_record("mint_cp", 1_700_000_000, Some(10_000.0)))
            .await
            .unwrap();

        let sample = MarketSnapshot {
            market_cap_usd: 25_000.0,
            ath_market_cap: 30_000.0,
            holders: Some(300),
            liquidity_usd: None,
            price_usd: Some(0.00003),
            buys: Some(40),
            sells: Some(12),
        };
        let fold = fixed_fold(30_000.0, 3.0);
        let summary = store
            .record_checkpoint("mint_cp", Checkpoint::OneHour, &sample, 1_700_003_600, &fold)
            .await
            .unwrap();
        assert_eq!(summary.true_multiple, 3.0);

        let stored_sample = store
            .load_sample("mint_cp", Checkpoint::OneHour)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_sample, sample);

        let outcome = store.load_outcome("mint_cp").await.unwrap().unwrap();
        assert_eq!(outcome.best_ath_ever, Some(30_000.0));
        assert_eq!(outcome.true_multiple, Some(3.0));
        assert!(outcome.flags.reached(3));
        assert!(!outcome.flags.reached(5));
    }

    #[tokio::test]
    async fn test_checkpoint_written_at_most_once() {
        let store = SqliteSignalStore::open_in_memory().unwrap();
        store
            .insert_signal(&make_record("mint_once", 1_700_000_000, Some(10_000.0)))
            .await
            .unwrap();

        let fold = fixed_fold(20_000.0, 2.0);
        store
            .record_checkpoint("mint_once", Checkpoint::FiveMinutes, &MarketSnapshot::default(), 1, &fold)
            .await
            .unwrap();

        let fold = fixed_fold(90_000.0, 9.0);
        let result = store
            .record_checkpoint("mint_once", Checkpoint::FiveMinutes, &MarketSnapshot::default(), 2, &fold)
            .await;
        assert!(matches!(
            result,
            Err(TrackerError::CheckpointAlreadyRecorded { .. })
        ));

        // Failed write left the summary untouched
        let outcome = store.load_outcome("mint_once").await.unwrap().unwrap();
        assert_eq!(outcome.true_multiple, Some(2.0));
    }

    #[tokio::test]
    async fn test_record_checkpoint_unknown_address() {
        let store = SqliteSignalStore::open_in_memory().unwrap();
        let fold = fixed_fold(1.0, 1.0);
        let result = store
            .record_checkpoint("missing", Checkpoint::OneHour, &MarketSnapshot::default(), 1, &fold)
            .await;
        assert!(matches!(result, Err(TrackerError::RecordNotFound(ref a)) if a == "missing"));
    }

    #[tokio::test]
    async fn test_due_for_checkpoint_filters_age_and_sampled() {
        let store = SqliteSignalStore::open_in_memory().unwrap();
        let now = 1_700_000_000;
        store.insert_signal(&make_record("old", now - 7_200, Some(1.0))).await.unwrap();
        store.insert_signal(&make_record("exact", now - 3_600, Some(1.0))).await.unwrap();
        store.insert_signal(&make_record("young", now - 60, Some(1.0))).await.unwrap();

        let cutoff = now - Checkpoint::OneHour.min_age_secs();
        let due = store.due_for_checkpoint(Checkpoint::OneHour, cutoff).await.unwrap();
        let addresses: Vec<&str> = due.iter().map(|d| d.contract_address.as_str()).collect();
        assert_eq!(addresses, vec!["old", "exact"]);

        let fold = fixed_fold(1.0, 1.0);
        store
            .record_checkpoint("old", Checkpoint::OneHour, &MarketSnapshot::default(), now, &fold)
            .await
            .unwrap();

        let due = store.due_for_checkpoint(Checkpoint::OneHour, cutoff).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].contract_address, "exact");

        // Other checkpoints are unaffected
        let due = store
            .due_for_checkpoint(Checkpoint::FiveMinutes, now - 300)
            .await
            .unwrap();
        assert_eq!(due.len(), 2);
    }

    #[tokio::test]
    async fn test_completed_rows_require_terminal_sample() {
        let store = SqliteSignalStore::open_in_memory().unwrap();
        store.insert_signal(&make_record("done", 1, Some(1.0))).await.unwrap();
        store.insert_signal(&make_record("pending", 2, Some(1.0))).await.unwrap();

        let fold = fixed_fold(2.0, 2.0);
        store
            .record_checkpoint("done", Checkpoint::SevenDays, &MarketSnapshot::default(), 10, &fold)
            .await
            .unwrap();
        store
            .record_checkpoint("pending", Checkpoint::OneDay, &MarketSnapshot::default(), 10, &fold)
            .await
            .unwrap();

        let rows = store.load_completed_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].contract_address, "done");
        assert!(rows[0].flags.reached_x2());
        assert_eq!(rows[0].true_multiple, 2.0);
        assert_eq!(rows[0].platform.as_deref(), Some("pump.fun"));
    }

    #[tokio::test]
    async fn test_wallet_summary_upsert() {
        let store = SqliteSignalStore::open_in_memory().unwrap();
        let mut summary = WalletSummary {
            wallet_name: "alpha".to_string(),
            wallet_address: None,
            total_signals: 3,
            total_x2: 1,
            winrate: 33.3,
            last_updated: 100,
        };
        store.upsert_wallet_summary(&summary).await.unwrap();

        summary.total_signals = 4;
        summary.total_x2 = 2;
        summary.winrate = 50.0;
        summary.last_updated = 200;
        store.upsert_wallet_summary(&summary).await.unwrap();

        let rows = store.load_wallet_summaries().await.unwrap();
        assert_eq!(rows, vec![summary]);
    }

    #[tokio::test]
    async fn test_reference_price_history() {
        let store = SqliteSignalStore::open_in_memory().unwrap();
        store
            .save_reference_price(151.2, 1_700_000_000, "2023-11-14 22:00")
            .await
            .unwrap();
        store
            .save_reference_price(149.0, 1_699_990_000, "2023-11-14 19:00")
            .await
            .unwrap();

        let history = store.load_reference_prices().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].period_label, "2023-11-14 19:00");
        assert_eq!(
            history[1],
            ReferencePricePoint {
                timestamp: 1_700_000_000,
                price_usd: 151.2,
                period_label: "2023-11-14 22:00".to_string(),
            }
        );
    }
}
