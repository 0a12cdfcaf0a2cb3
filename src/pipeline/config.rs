//! Tracker configuration from environment variables

use super::error::TrackerError;
use std::env;
use std::time::Duration;

/// Wrapped SOL mint, used as the reference-price token
pub const DEFAULT_REFERENCE_TOKEN: &str = "So11111111111111111111111111111111111111112";

/// Configuration for the outcome tracker
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Market data API base URL (no trailing slash)
    pub api_base_url: String,

    /// Market data API key (sent as `x-api-key`)
    pub api_key: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Pause between records within a checkpoint pass, in milliseconds
    pub record_delay_ms: u64,

    /// Reference price cache time-to-live in seconds
    pub reference_price_ttl_secs: i64,

    /// Token whose USD price is used as the reference price
    pub reference_token: String,

    /// Minimum included records for a wallet to appear in the breakdown
    pub min_wallet_signals: usize,
}

impl TrackerConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `OUTCOMES_DB_PATH` (default: data/snapshots.db)
    /// - `SOLANA_API_BASE_URL` (default: https://data.solanatracker.io)
    /// - `SOLANA_API_KEY` (default: empty)
    /// - `PROVIDER_TIMEOUT_SECS` (default: 10)
    /// - `RECORD_DELAY_MS` (default: 300)
    /// - `REFERENCE_PRICE_TTL_SECS` (default: 21600)
    /// - `REFERENCE_TOKEN_ADDRESS` (default: wrapped SOL mint)
    /// - `MIN_WALLET_SIGNALS` (default: 3)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            db_path: lookup("OUTCOMES_DB_PATH").unwrap_or_else(|| "data/snapshots.db".to_string()),

            api_base_url: lookup("SOLANA_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://data.solanatracker.io".to_string()),

            api_key: lookup("SOLANA_API_KEY").unwrap_or_default(),

            request_timeout_secs: lookup("PROVIDER_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),

            record_delay_ms: lookup("RECORD_DELAY_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),

            reference_price_ttl_secs: lookup("REFERENCE_PRICE_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(6 * 60 * 60),

            reference_token: lookup("REFERENCE_TOKEN_ADDRESS")
                .unwrap_or_else(|| DEFAULT_REFERENCE_TOKEN.to_string()),

            min_wallet_signals: lookup("MIN_WALLET_SIGNALS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
        }
    }

    /// Check settings required before any network call
    pub fn validate_for_network(&self) -> Result<(), TrackerError> {
        if self.api_key.trim().is_empty() {
            return Err(TrackerError::Config(
                "Missing required environment variable: SOLANA_API_KEY".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn record_delay(&self) -> Duration {
        Duration::from_millis(self.record_delay_ms)
    }
}
