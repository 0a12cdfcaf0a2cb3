//! Outcome checker - runs checkpoint passes and prints the report
//!
//! Usage:
//!   cargo run --release --bin check_outcomes                  # all due checkpoints
//!   cargo run --release --bin check_outcomes -- -c 1h         # one checkpoint
//!   cargo run --release --bin check_outcomes -- --report-only # no API calls
//!
//! Environment variables:
//!   OUTCOMES_DB_PATH - SQLite database path (default: data/snapshots.db)
//!   SOLANA_API_KEY - Market data API key (required unless --report-only)
//!   RECORD_DELAY_MS - Pause between records (default: 300)
//!
//! Logs go to stderr; the report goes to stdout.

use clap::Parser;
use dotenv::dotenv;
use env_logger::{Builder, Env, Target};
use log::{error, info, warn};
use signal_outcomes::pipeline::{
    render_report, Checkpoint, OutcomeEngine, PassSummary, SignalStore, SolanaTrackerClient,
    SqliteSignalStore, StatsAggregator, SystemClock, TrackerConfig, TrackerError,
};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "check_outcomes", about = "Record checkpoint outcomes for tracked signals")]
struct Args {
    /// Run a single checkpoint (5min, 20min, 1h, 3h, 6h, 24h, 7d)
    #[arg(short = 'c', long, conflicts_with_all = ["all", "report_only"])]
    checkpoint: Option<String>,

    /// Run every due checkpoint (default)
    #[arg(long, conflicts_with = "report_only")]
    all: bool,

    /// Only print the report, no API calls
    #[arg(long)]
    report_only: bool,

    /// Database path (overrides OUTCOMES_DB_PATH)
    #[arg(long)]
    db: Option<String>,
}

async fn print_report(store: &dyn SignalStore, config: &TrackerConfig) -> Result<(), TrackerError> {
    let total = store.count_signals().await?;
    let rows = store.load_completed_rows().await?;
    let report = StatsAggregator::new(config.min_wallet_signals).aggregate(total, &rows);
    print!("{}", render_report(&report));
    Ok(())
}

fn log_passes(passes: &[PassSummary]) {
    let recorded: usize = passes.iter().map(|p| p.recorded).sum();
    let skipped: usize = passes.iter().map(|p| p.skipped).sum();
    let failed: usize = passes.iter().map(|p| p.failed).sum();

    info!("📈 Pass complete");
    for pass in passes.iter().filter(|p| p.due > 0) {
        info!(
            "   ├─ {:8} {} due, {} recorded",
            pass.checkpoint.label(),
            pass.due,
            pass.recorded
        );
    }
    info!(
        "   └─ Total: {} recorded, {} skipped, {} failed",
        recorded, skipped, failed
    );
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = TrackerConfig::from_env();
    if let Some(db) = args.db {
        config.db_path = db;
    }

    info!("🚀 Outcome checker");
    info!("   ├─ Database: {}", config.db_path);

    let store = Arc::new(SqliteSignalStore::open(&config.db_path)?);

    if args.report_only {
        info!("   └─ Mode: report only");
        print_report(&*store, &config).await?;
        return Ok(());
    }

    config.validate_for_network()?;

    let checkpoint = match args.checkpoint.as_deref() {
        Some(name) => Some(name.parse::<Checkpoint>()?),
        None => None,
    };
    match checkpoint {
        Some(cp) => info!("   └─ Mode: checkpoint {}", cp.label()),
        None if args.all => info!("   └─ Mode: all due checkpoints"),
        None => info!("   └─ Mode: all due checkpoints (default)"),
    }

    let provider = Arc::new(SolanaTrackerClient::new(&config)?);
    let engine = OutcomeEngine::new(
        store.clone(),
        provider,
        Arc::new(SystemClock),
        config.record_delay(),
    );

    let passes = match checkpoint {
        Some(cp) => vec![engine.run_checkpoint(cp.as_str()).await?],
        None => engine.run_all().await?,
    };
    log_passes(&passes);

    if let Err(e) = engine.refresh_leaderboard().await {
        if e.is_fatal() {
            return Err(e.into());
        }
        warn!("⚠️  Leaderboard refresh failed: {}", e);
    }
    print_report(&*store, &config).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("❌ Fatal: {}", e);
        return Err(e);
    }

    Ok(())
}
