//! Initial quote set.
//!
//! Every configured instrument is seeded before anything is published: a single
//! failing seed aborts the whole run and leaves the store untouched.

use crate::store::quote_store::QuoteStore;
use log::{info, warn};
use market_common::{Instrument, MarketError, Quote, Result};
use rand::Rng;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

const SEED_PRICE_MIN: f64 = 0.5;
const SEED_PRICE_MAX: f64 = 2.5;
const SEED_CHANGE_MAX: f64 = 5.0;
/// Widest distance of the seeded high/low from the price, relative to it.
const SEED_RANGE: f64 = 0.02;

/// Produces the starting quote for an instrument.
pub trait QuoteSeeder: Send + Sync {
    /// Returns a quote for `instrument` or an error that aborts initialization.
    fn seed(&self, instrument: &Instrument) -> Result<Quote>;
}

/// Seeds random but plausible quotes.
///
/// Price is sampled from `[0.5, 2.5)`, change from `[-5, 5)` percent, and
/// `low <= price <= high` always holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticSeeder;

impl QuoteSeeder for SyntheticSeeder {
    fn seed(&self, instrument: &Instrument) -> Result<Quote> {
        let mut rng = rand::rng();
        let price = rng.random_range(SEED_PRICE_MIN..SEED_PRICE_MAX);
        let change = rng.random_range(-SEED_CHANGE_MAX..SEED_CHANGE_MAX);
        let high = price * (1.0 + rng.random_range(0.0..SEED_RANGE));
        let low = price * (1.0 - rng.random_range(0.0..SEED_RANGE));
        Ok(Quote::seeded(instrument, price, change, high, low))
    }
}

/// Seeds every instrument and publishes the full set to `store`.
///
/// Returns the published quotes keyed by symbol. Any seed error, a seed for the
/// wrong symbol, or a non-finite price fails with `MarketError::Initialization`
/// and publishes nothing. An empty instrument list is an error as well.
pub fn initialize<Q: QuoteSeeder + ?Sized>(
    instruments: &[Instrument],
    seeder: &Q,
    store: &QuoteStore,
) -> Result<HashMap<String, Quote>> {
    if instruments.is_empty() {
        return Err(MarketError::Initialization(
            "no instruments configured".to_string(),
        ));
    }

    let mut seeded = Vec::with_capacity(instruments.len());
    for instrument in instruments {
        let quote = seeder.seed(instrument).map_err(|e| {
            MarketError::Initialization(format!("{}: {}", instrument.symbol, e))
        })?;
        if quote.symbol != instrument.symbol {
            return Err(MarketError::Initialization(format!(
                "{}: seeder returned a quote for {}",
                instrument.symbol, quote.symbol
            )));
        }
        if !quote.price.is_finite() {
            return Err(MarketError::Initialization(format!(
                "{}: price is not finite",
                instrument.symbol
            )));
        }
        seeded.push(quote);
    }

    let published: HashMap<String, Quote> = seeded
        .iter()
        .map(|quote| (quote.symbol.clone(), quote.clone()))
        .collect();
    store.replace_all(seeded);
    info!("Initialized {} quote(s)", published.len());
    Ok(published)
}

/// Runs [`initialize`] up to `attempts` times, sleeping `backoff * attempt`
/// between tries. Returns the last error when every attempt fails.
pub fn initialize_with_retry<Q: QuoteSeeder + ?Sized>(
    instruments: &[Instrument],
    seeder: &Q,
    store: &QuoteStore,
    attempts: u32,
    backoff: Duration,
) -> Result<HashMap<String, Quote>> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match initialize(instruments, seeder, store) {
            Ok(quotes) => return Ok(quotes),
            Err(e) if attempt < attempts => {
                warn!("Initialization attempt {attempt}/{attempts} failed: {e}");
                thread::sleep(backoff * attempt);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
