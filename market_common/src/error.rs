//! Error types shared across the market desk workspace.
//!
//! The `MarketError` enum unifies the failure cases of the feed core (seeding,
//! subscriptions), configuration and catalog parsing, and the portfolio file
//! store, allowing every crate to propagate a single error type.
//!
//! Poisoned locks are not an error: every lock in the workspace recovers the
//! guard and keeps the last written state.
use std::io;

use thiserror::Error;

/// Unified error type shared by the feed core and the desk binary.
#[derive(Error, Debug)]
pub enum MarketError {
    /// I/O error originating from files or the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// A configuration value is missing or outside its allowed range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The requested symbol is not part of the configured instrument catalog.
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    /// Error while parsing an instrument catalog file.
    #[error("Parse instrument catalog error: {0}")]
    ParseCatalog(String),

    /// Seeding the initial quote set failed; nothing was published.
    #[error("Quote initialization failed: {0}")]
    Initialization(String),

    /// A tick source could not start a stream for a symbol.
    #[error("Subscription failed for {symbol}: {reason}")]
    Subscription {
        /// Symbol the caller tried to subscribe to.
        symbol: String,
        /// Short description of the underlying failure.
        reason: String,
    },

    /// Crossbeam channel receive failed because every sender is gone.
    #[error("Channel receive failed: {0}")]
    ChannelRecv(#[from] crossbeam_channel::RecvError),

    /// A position record failed validation.
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// No position with the given id exists in the portfolio.
    #[error("Position not found: {0}")]
    PositionNotFound(i64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn closed_channel_converts_to_recv_error() {
        let (tx, rx) = bounded::<()>(1);
        drop(tx);

        let err: MarketError = rx.recv().unwrap_err().into();

        assert!(matches!(err, MarketError::ChannelRecv(_)));
        assert!(err.to_string().starts_with("Channel receive failed"));
    }

    #[test]
    fn position_not_found_names_the_id() {
        assert_eq!(
            MarketError::PositionNotFound(42).to_string(),
            "Position not found: 42"
        );
    }
}
