//! Reference price cache
//!
//! Holds the last known reference-token USD price with an explicit TTL and
//! an injected clock. A failed refresh keeps serving the last known value.
//! Successful refreshes are appended to `reference_price_history` when a
//! store is attached.

use super::clock::Clock;
use super::db::SignalStore;
use super::provider::MarketDataProvider;
use chrono::{TimeZone, Utc};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq)]
struct CachedPrice {
    price_usd: f64,
    fetched_at: i64,
}

pub struct ReferencePriceCache {
    ttl_secs: i64,
    clock: Arc<dyn Clock>,
    history: Option<Arc<dyn SignalStore>>,
    entry: Mutex<Option<CachedPrice>>,
}

impl ReferencePriceCache {
    pub fn new(ttl_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl_secs,
            clock,
            history: None,
            entry: Mutex::new(None),
        }
    }

    /// Record every successful refresh in `store`
    pub fn with_history(mut self, store: Arc<dyn SignalStore>) -> Self {
        self.history = Some(store);
        self
    }

    fn cached(&self) -> Option<CachedPrice> {
        match self.entry.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn store_entry(&self, entry: CachedPrice) {
        match self.entry.lock() {
            Ok(mut guard) => *guard = Some(entry),
            Err(poisoned) => *poisoned.into_inner() = Some(entry),
        }
    }

    /// Last known price, regardless of age (no network)
    pub fn last_known(&self) -> Option<f64> {
        self.cached().map(|c| c.price_usd)
    }

    /// True when nothing is cached or the cached value is older than the TTL
    pub fn is_stale(&self) -> bool {
        match self.cached() {
            Some(c) => self.clock.now_ts() - c.fetched_at >= self.ttl_secs,
            None => true,
        }
    }

    /// Fetch a fresh price; on failure keep and return the last known value
    pub async fn refresh(&self, provider: &dyn MarketDataProvider) -> Option<f64> {
        match provider.fetch_reference_price().await {
            Some(price) => {
                let now = self.clock.now_ts();
                self.store_entry(CachedPrice {
                    price_usd: price,
                    fetched_at: now,
                });
                log::info!("💰 Reference price updated: ${:.2}", price);

                if let Some(store) = &self.history {
                    let label = period_label(now);
                    if let Err(e) = store.save_reference_price(price, now, &label).await {
                        log::error!("❌ Failed to save reference price history: {}", e);
                    }
                }

                Some(price)
            }
            None => {
                log::warn!("⚠️  Could not fetch reference price, keeping last known value");
                self.last_known()
            }
        }
    }

    /// Cached price while fresh, otherwise refresh
    pub async fn current(&self, provider: &dyn MarketDataProvider) -> Option<f64> {
        if self.is_stale() {
            self.refresh(provider).await
        } else {
            self.last_known()
        }
    }
}

/// Hour-resolution label, e.g. `2023-11-14 22:00`
pub fn period_label(ts: i64) -> String {
    match Utc.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:00").to_string(),
        None => ts.to_string(),
    }
}
