//! Signal registration - turns a parsed signal into a persisted record
//!
//! Creation is the only point at which baseline fields, derived time fields
//! and the exclusion decision are set. A second signal for an address that
//! already has a record is reported as a duplicate and writes nothing.

use super::classifier::classify;
use super::clock::Clock;
use super::db::SignalStore;
use super::error::TrackerError;
use super::price_cache::ReferencePriceCache;
use super::provider::MarketDataProvider;
use super::types::{NewSignal, SignalRecord, TimeFields};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::sync::Arc;

/// Result of one registration attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    Registered(SignalRecord),
    Duplicate,
}

/// UTC time fields for a detection timestamp
pub fn time_fields(ts: i64) -> TimeFields {
    let dt = DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default();

    TimeFields {
        day_of_week: dt.weekday().num_days_from_monday(),
        hour_of_day: dt.hour(),
        week_number: dt.iso_week().week(),
        month: dt.month(),
    }
}

pub struct SignalRegistrar {
    store: Arc<dyn SignalStore>,
    provider: Arc<dyn MarketDataProvider>,
    price_cache: Arc<ReferencePriceCache>,
    clock: Arc<dyn Clock>,
}

impl SignalRegistrar {
    pub fn new(
        store: Arc<dyn SignalStore>,
        provider: Arc<dyn MarketDataProvider>,
        price_cache: Arc<ReferencePriceCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            provider,
            price_cache,
            clock,
        }
    }

    /// Register a new signal
    ///
    /// Token reading, ATH and reference price are fetched concurrently. Any
    /// of them may be missing; the record is created regardless, and a
    /// missing ATH leads to exclusion.
    pub async fn register(&self, signal: NewSignal) -> Result<RegisterOutcome, TrackerError> {
        let address = signal.contract_address.trim().to_string();

        if self.store.signal_exists(&address).await? {
            log::debug!("⏭️  {} already tracked, ignoring duplicate signal", address);
            return Ok(RegisterOutcome::Duplicate);
        }

        let provider = self.provider.as_ref();
        let (token, ath, reference_price) = tokio::join!(
            provider.fetch_token(&address),
            provider.fetch_ath(&address),
            self.price_cache.current(provider),
        );

        let detected_at = self.clock.now_ts();
        let pool = token.as_ref().and_then(|t| t.best_pool.as_ref());
        let baseline = pool.map(|p| p.market_cap_usd).filter(|mc| *mc > 0.0);
        let classification = classify(baseline, ath);

        let record = SignalRecord {
            contract_address: address.clone(),
            symbol: token
                .as_ref()
                .and_then(|t| t.symbol.clone())
                .or_else(|| signal.symbol.clone()),
            first_detected_at: detected_at,
            wallet_name: signal.wallet_name,
            wallet_address: signal.wallet_address,
            source_channel: signal.source_channel,
            signal_mc_usd: signal.signal_mc_usd,
            signal_lq_usd: signal.signal_lq_usd,
            seen_minutes: signal.seen_minutes,
            api_mc_usd: baseline,
            api_liquidity_usd: pool.and_then(|p| p.liquidity_usd),
            api_price_usd: pool.and_then(|p| p.price_usd),
            holders: token.as_ref().and_then(|t| t.holders),
            txns_buys: pool.and_then(|p| p.buys),
            txns_sells: pool.and_then(|p| p.sells),
            platform: token.as_ref().and_then(|t| t.platform.clone()),
            ath_market_cap: ath,
            reference_price_usd: reference_price,
            time: time_fields(detected_at),
            ath_ratio: classification.ath_ratio,
            is_excluded: classification.is_excluded,
        };

        if !self.store.insert_signal(&record).await? {
            log::debug!("⏭️  {} inserted concurrently, ignoring duplicate signal", address);
            return Ok(RegisterOutcome::Duplicate);
        }

        log::info!(
            "🆕 Tracking {} ({}) from {} | MC ${:.0} | ATH ${:.0} | {}",
            record.symbol.as_deref().unwrap_or("???"),
            address,
            record.wallet_name,
            baseline.unwrap_or(0.0),
            ath.unwrap_or(0.0),
            if record.is_excluded { "EXCLUDED" } else { "included" }
        );

        Ok(RegisterOutcome::Registered(record))
    }
}
