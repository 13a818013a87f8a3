//! `Result` alias used by every market crate.
use crate::error::MarketError;

/// `Result` whose error defaults to [`MarketError`].
pub type Result<T, E = MarketError> = std::result::Result<T, E>;
