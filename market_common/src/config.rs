//! Feed configuration constants and validation.
//!
//! Raw, optional settings arrive as [`FeedArgs`] (from CLI flags or a JSON
//! document) and are normalized into a validated [`FeedConfig`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::MarketError;

/// Instrument observed when none is selected explicitly.
pub const DEFAULT_SYMBOL: &str = "EURUSD";
/// Period between two generated ticks.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
#[allow(missing_docs)]
pub const MIN_TICK_INTERVAL_MS: u64 = 10;
#[allow(missing_docs)]
pub const MAX_TICK_INTERVAL_MS: u64 = 60_000;
/// Number of ticks kept for the live chart.
pub const DEFAULT_WINDOW_CAPACITY: usize = 60;
#[allow(missing_docs)]
pub const MIN_WINDOW_CAPACITY: usize = 1;
#[allow(missing_docs)]
pub const MAX_WINDOW_CAPACITY: usize = 10_000;
/// How many times a failed initialization is attempted before giving up.
pub const DEFAULT_INIT_ATTEMPTS: u32 = 3;
/// Pause between two initialization attempts, multiplied by the attempt number.
pub const DEFAULT_INIT_BACKOFF_MS: u64 = 500;

/// Unvalidated feed settings; every field falls back to its default.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedArgs {
    pub symbol: Option<String>,
    pub tick_interval_ms: Option<u64>,
    pub window_capacity: Option<usize>,
    pub init_attempts: Option<u32>,
}

/// Validated feed settings.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub symbol: String,
    pub tick_interval: Duration,
    pub window_capacity: usize,
    pub init_attempts: u32,
    pub init_backoff: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            symbol: DEFAULT_SYMBOL.to_string(),
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            init_attempts: DEFAULT_INIT_ATTEMPTS,
            init_backoff: Duration::from_millis(DEFAULT_INIT_BACKOFF_MS),
        }
    }
}

impl FeedArgs {
    /// Applies defaults and range checks.
    pub fn normalize(self) -> Result<FeedConfig, MarketError> {
        let symbol = self
            .symbol
            .unwrap_or_else(|| DEFAULT_SYMBOL.to_string())
            .trim()
            .to_ascii_uppercase();
        if symbol.is_empty() || !symbol.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(MarketError::Config(
                "symbol must be non-empty alphanumeric ASCII".to_string(),
            ));
        }

        let tick_interval_ms = self.tick_interval_ms.unwrap_or(DEFAULT_TICK_INTERVAL_MS);
        if !(MIN_TICK_INTERVAL_MS..=MAX_TICK_INTERVAL_MS).contains(&tick_interval_ms) {
            return Err(MarketError::Config(format!(
                "tickIntervalMs must be between {MIN_TICK_INTERVAL_MS} and {MAX_TICK_INTERVAL_MS}"
            )));
        }

        let window_capacity = self.window_capacity.unwrap_or(DEFAULT_WINDOW_CAPACITY);
        if !(MIN_WINDOW_CAPACITY..=MAX_WINDOW_CAPACITY).contains(&window_capacity) {
            return Err(MarketError::Config(format!(
                "windowCapacity must be between {MIN_WINDOW_CAPACITY} and {MAX_WINDOW_CAPACITY}"
            )));
        }

        let init_attempts = self.init_attempts.unwrap_or(DEFAULT_INIT_ATTEMPTS);
        if init_attempts == 0 {
            return Err(MarketError::Config(
                "initAttempts must be at least 1".to_string(),
            ));
        }

        Ok(FeedConfig {
            symbol,
            tick_interval: Duration::from_millis(tick_interval_ms),
            window_capacity,
            init_attempts,
            init_backoff: Duration::from_millis(DEFAULT_INIT_BACKOFF_MS),
        })
    }
}
