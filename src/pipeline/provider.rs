//! Market snapshot provider interface
//!
//! The provider answers "what does the market look like for address X right
//! now". Every call is best-effort: `None` means the call failed, timed out
//! or returned nothing usable, and callers degrade the affected fields.

use super::types::MarketSnapshot;
use async_trait::async_trait;

/// Best pool of a token (highest positive market cap)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolReading {
    pub market_cap_usd: f64,
    pub liquidity_usd: Option<f64>,
    pub price_usd: Option<f64>,
    pub buys: Option<i64>,
    pub sells: Option<i64>,
}

/// Token-level reading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenReading {
    pub symbol: Option<String>,
    pub platform: Option<String>,
    pub holders: Option<i64>,
    pub best_pool: Option<PoolReading>,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Current token reading (holders + best pool)
    async fn fetch_token(&self, address: &str) -> Option<TokenReading>;

    /// ATH market cap in USD as currently reported
    async fn fetch_ath(&self, address: &str) -> Option<f64>;

    /// USD price of the reference token
    async fn fetch_reference_price(&self) -> Option<f64>;
}

/// Fold a token reading and an ATH reading into a snapshot
pub fn build_snapshot(token: Option<&TokenReading>, ath: Option<f64>) -> MarketSnapshot {
    let mut snapshot = MarketSnapshot {
        ath_market_cap: ath.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0),
        ..Default::default()
    };

    if let Some(token) = token {
        snapshot.holders = token.holders;
        if let Some(pool) = &token.best_pool {
            snapshot.market_cap_usd = pool.market_cap_usd.max(0.0);
            snapshot.liquidity_usd = pool.liquidity_usd;
            snapshot.price_usd = pool.price_usd;
            snapshot.buys = pool.buys;
            snapshot.sells = pool.sells;
        }
    }

    snapshot
}

/// Fetch the current snapshot for `address`
///
/// The token and ATH calls run concurrently; both are awaited before the
/// snapshot is built.
pub async fn sample_market(provider: &dyn MarketDataProvider, address: &str) -> MarketSnapshot {
    let (token, ath) = tokio::join!(provider.fetch_token(address), provider.fetch_ath(address));
    build_snapshot(token.as_ref(), ath)
}
