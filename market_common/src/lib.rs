//!
//! Common types and utilities shared by the market feed core and the desk binary.
//!
//! This crate aggregates:
//! - `error`: unified error type `MarketError` used across the workspace.
//! - `result`: handy `Result<T, MarketError>` alias.
//! - `instruments`: instrument identities and catalog parsing.
//! - `quote`: `Tick` and `Quote` records plus the tick merge rule.
//! - `config`: feed defaults, limits and validation.
//! - `exchange`: static venue table and open/closed lookup.
#![warn(missing_docs)]
pub mod config;
pub mod error;
pub mod exchange;
pub mod instruments;
pub mod quote;
pub mod result;

pub use error::MarketError;
pub use instruments::Instrument;
pub use quote::{Quote, Tick};
pub use result::Result;
