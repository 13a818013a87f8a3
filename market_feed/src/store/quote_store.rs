//! In-memory quote map keyed by symbol.
//!
//! Quotes keep the order in which instruments were configured (or first seen);
//! merges never reorder them. The whole read-modify-write of a merge happens
//! under one write lock, so ticks arriving from several worker threads cannot
//! interleave.

use log::trace;
use market_common::{Quote, Tick};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Quotes {
    order: Vec<String>,
    by_symbol: HashMap<String, Quote>,
}

/// Latest quote per instrument.
#[derive(Debug, Default)]
pub struct QuoteStore {
    inner: RwLock<Quotes>,
}

impl QuoteStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Quotes> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Quotes> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Folds `tick` into the stored quote for its symbol and returns the result.
    ///
    /// An unknown symbol gets a fresh quote appended after the configured ones.
    /// See [`Quote::apply_tick`] for the per-field rule.
    pub fn merge(&self, tick: &Tick) -> Quote {
        let mut quotes = self.write();
        let merged = match quotes.by_symbol.get_mut(&tick.symbol) {
            Some(existing) => {
                existing.apply_tick(tick);
                existing.clone()
            }
            None => {
                let fresh = Quote::from_tick(tick);
                quotes.order.push(tick.symbol.clone());
                quotes.by_symbol.insert(tick.symbol.clone(), fresh.clone());
                fresh
            }
        };
        trace!("Merged {} price={:.5}", merged.symbol, merged.price);
        merged
    }

    /// Replaces the whole store with `quotes`, in the given order.
    ///
    /// Later duplicates of a symbol overwrite earlier ones without changing its position.
    pub fn replace_all(&self, quotes: Vec<Quote>) {
        let mut fresh = Quotes::default();
        for quote in quotes {
            if !fresh.by_symbol.contains_key(&quote.symbol) {
                fresh.order.push(quote.symbol.clone());
            }
            fresh.by_symbol.insert(quote.symbol.clone(), quote);
        }
        *self.write() = fresh;
    }

    /// Copy of the quote for `symbol`.
    pub fn get(&self, symbol: &str) -> Option<Quote> {
        self.read().by_symbol.get(symbol).cloned()
    }

    /// Copies of all quotes in configuration order.
    pub fn get_all(&self) -> Vec<Quote> {
        let quotes = self.read();
        quotes
            .order
            .iter()
            .filter_map(|symbol| quotes.by_symbol.get(symbol).cloned())
            .collect()
    }

    /// Symbols in configuration order.
    pub fn symbols(&self) -> Vec<String> {
        self.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
