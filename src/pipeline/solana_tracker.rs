//! Solana Tracker API integration
//!
//! Implements `MarketDataProvider` over the Solana Tracker data API.
//!
//! ## API Reference
//!
//! - `GET /tokens/{mint}` - token info, holders and all pools
//! - `GET /tokens/{mint}/ath` - all-time-high market cap
//!
//! Every request carries the `x-api-key` header and the configured timeout.
//! Failures (timeout, transport, non-2xx, undecodable body) are logged and
//! returned as `None`; they never abort a pass.

use super::config::TrackerConfig;
use super::error::TrackerError;
use super::provider::{MarketDataProvider, PoolReading, TokenReading};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// `{ "usd": 123.4, ... }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsdAmount {
    pub usd: Option<f64>,
}

/// Buy/sell counter: either a bare number or `{ "total": n }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TxnCount {
    Count(i64),
    Fractional(f64),
    Detailed { total: Option<i64> },
}

impl TxnCount {
    pub fn total(&self) -> Option<i64> {
        match self {
            TxnCount::Count(n) => Some(*n),
            TxnCount::Fractional(n) => Some(*n as i64),
            TxnCount::Detailed { total } => *total,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolTxns {
    pub buys: Option<TxnCount>,
    pub sells: Option<TxnCount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pool {
    #[serde(rename = "marketCap")]
    pub market_cap: Option<UsdAmount>,
    pub liquidity: Option<UsdAmount>,
    pub price: Option<UsdAmount>,
    pub txns: Option<PoolTxns>,
}

impl Pool {
    pub fn market_cap_usd(&self) -> f64 {
        self.market_cap
            .as_ref()
            .and_then(|m| m.usd)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenInfo {
    pub symbol: Option<String>,
    #[serde(rename = "createdOn")]
    pub created_on: Option<String>,
}

/// `/tokens/{mint}` response
///
/// Pools are kept as raw JSON and decoded one by one so a single malformed
/// entry does not discard the whole response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<TokenInfo>,
    #[serde(default)]
    pub pools: Vec<serde_json::Value>,
    pub holders: Option<serde_json::Number>,
}

impl TokenResponse {
    pub fn decoded_pools(&self) -> Vec<Pool> {
        self.pools
            .iter()
            .filter(|p| p.is_object())
            .filter_map(|p| serde_json::from_value::<Pool>(p.clone()).ok())
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NestedAth {
    pub market_cap: Option<f64>,
}

/// `/tokens/{mint}/ath` response (several shapes seen in the wild)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AthResponse {
    pub highest_market_cap: Option<f64>,
    #[serde(rename = "marketCap")]
    pub market_cap: Option<UsdAmount>,
    pub ath: Option<NestedAth>,
}

/// Pool with the highest positive market cap
pub fn best_pool(pools: &[Pool]) -> Option<&Pool> {
    pools
        .iter()
        .filter(|p| p.market_cap_usd() > 0.0)
        .max_by(|a, b| a.market_cap_usd().total_cmp(&b.market_cap_usd()))
}

/// Extract a `TokenReading` from a `/tokens/{mint}` response
pub fn parse_token_response(response: &TokenResponse) -> TokenReading {
    let pools = response.decoded_pools();

    let best_pool = best_pool(&pools).map(|pool| PoolReading {
        market_cap_usd: pool.market_cap_usd(),
        liquidity_usd: pool.liquidity.as_ref().and_then(|l| l.usd),
        price_usd: pool.price.as_ref().and_then(|p| p.usd),
        buys: pool.txns.as_ref().and_then(|t| t.buys.as_ref()).and_then(TxnCount::total),
        sells: pool.txns.as_ref().and_then(|t| t.sells.as_ref()).and_then(TxnCount::total),
    });

    TokenReading {
        symbol: response.token.as_ref().and_then(|t| t.symbol.clone()),
        platform: response.token.as_ref().and_then(|t| t.created_on.clone()),
        holders: response
            .holders
            .as_ref()
            .and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))),
        best_pool,
    }
}

/// Extract the ATH market cap; 0 and missing values mean unknown
pub fn parse_ath_response(response: &AthResponse) -> Option<f64> {
    [
        response.highest_market_cap,
        response.market_cap.as_ref().and_then(|m| m.usd),
        response.ath.as_ref().and_then(|a| a.market_cap),
    ]
    .into_iter()
    .flatten()
    .find(|v| v.is_finite() && *v > 0.0)
}

/// Reference price = first pool's USD price
pub fn parse_reference_price(response: &TokenResponse) -> Option<f64> {
    response
        .pools
        .first()
        .and_then(|p| serde_json::from_value::<Pool>(p.clone()).ok())
        .and_then(|p| p.price.and_then(|price| price.usd))
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// HTTP client for the Solana Tracker API
pub struct SolanaTrackerClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    reference_token: String,
}

impl SolanaTrackerClient {
    pub fn new(config: &TrackerConfig) -> Result<Self, TrackerError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            reference_token: config.reference_token.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Option<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = match self
            .http
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                log::warn!("⏱️  API {} timeout", endpoint);
                return None;
            }
            Err(e) => {
                log::warn!("⚠️  API {} error: {}", endpoint, e);
                return None;
            }
        };

        if !response.status().is_success() {
            log::warn!("⚠️  API {} returned {}", endpoint, response.status());
            return None;
        }

        match response.json::<T>().await {
            Ok(body) => Some(body),
            Err(e) => {
                log::warn!("⚠️  API {} decode error: {}", endpoint, e);
                None
            }
        }
    }
}

#[async_trait]
impl MarketDataProvider for SolanaTrackerClient {
    async fn fetch_token(&self, address: &str) -> Option<TokenReading> {
        let response: TokenResponse = self.get_json(&format!("/tokens/{}", address)).await?;
        Some(parse_token_response(&response))
    }

    async fn fetch_ath(&self, address: &str) -> Option<f64> {
        let response: AthResponse = self.get_json(&format!("/tokens/{}/ath", address)).await?;
        parse_ath_response(&response)
    }

    async fn fetch_reference_price(&self) -> Option<f64> {
        let response: TokenResponse = self
            .get_json(&format!("/tokens/{}", self.reference_token))
            .await?;
        parse_reference_price(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN_JSON: &str = r#"{
        "token": { "symbol": "CAT", "createdOn": "https://pump.fun" },
        "holders": 812,
        "pools": [
            { "marketCap": { "usd": 41000.5 }, "liquidity": { "usd": 9000 },
              "price": { "usd": 0.000041 }, "txns": { "buys": 120, "sells": 80 } },
            { "marketCap": { "usd": 52000 }, "liquidity": { "usd": 15000, "quote": 90.1 },
              "price": { "usd": 0.000052 },
              "txns": { "buys": { "total": 640 }, "sells": { "total": 300 } } },
            { "marketCap": { "usd": 0 } },
            "garbage"
        ]
    }"#;

    #[test]
    fn test_parse_token_picks_best_pool() {
        let response: TokenResponse = serde_json::from_str(TOKEN_JSON).unwrap();
        let reading = parse_token_response(&response);

        assert_eq!(reading.symbol.as_deref(), Some("CAT"));
        assert_eq!(reading.platform.as_deref(), Some("https://pump.fun"));
        assert_eq!(reading.holders, Some(812));

        let pool = reading.best_pool.unwrap();
        assert_eq!(pool.market_cap_usd, 52_000.0);
        assert_eq!(pool.liquidity_usd, Some(15_000.0));
        assert_eq!(pool.buys, Some(640));
        assert_eq!(pool.sells, Some(300));
    }

    #[test]
    fn test_parse_token_without_live_pools() {
        let response: TokenResponse = serde_json::from_str(
            r#"{ "holders": 5, "pools": [ { "marketCap": { "usd": 0 } }, { "marketCap": {} } ] }"#,
        )
        .unwrap();
        let reading = parse_token_response(&response);
        assert!(reading.best_pool.is_none());
        assert_eq!(reading.holders, Some(5));
        assert!(reading.symbol.is_none());
    }

    #[test]
    fn test_parse_ath_shapes() {
        let flat: AthResponse = serde_json::from_str(r#"{ "highest_market_cap": 90000 }"#).unwrap();
        assert_eq!(parse_ath_response(&flat), Some(90_000.0));

        let usd: AthResponse =
            serde_json::from_str(r#"{ "highest_market_cap": 0, "marketCap": { "usd": 70000 } }"#)
                .unwrap();
        assert_eq!(parse_ath_response(&usd), Some(70_000.0));

        let nested: AthResponse =
            serde_json::from_str(r#"{ "ath": { "market_cap": 65000 } }"#).unwrap();
        assert_eq!(parse_ath_response(&nested), Some(65_000.0));

        let empty: AthResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(parse_ath_response(&empty), None);
    }

    #[test]
    fn test_parse_reference_price_uses_first_pool() {
        let response: TokenResponse = serde_json::from_str(
            r#"{ "pools": [ { "price": { "usd": 151.37 } }, { "price": { "usd": 999 } } ] }"#,
        )
        .unwrap();
        assert_eq!(parse_reference_price(&response), Some(151.37));

        let response: TokenResponse = serde_json::from_str(r#"{ "pools": [] }"#).unwrap();
        assert_eq!(parse_reference_price(&response), None);
    }

    #[tokio::test]
    #[ignore] // Run only when testing with live API (needs SOLANA_API_KEY)
    async fn test_fetch_reference_price_live() {
        let config = TrackerConfig::from_env();
        let client = SolanaTrackerClient::new(&config).unwrap();
        let price = client.fetch_reference_price().await;
        assert!(price.unwrap_or(0.0) > 0.0);
    }
}
