//! Per-symbol subscription bookkeeping.
//!
//! A `SubscriptionRegistry` keeps at most one live stream per symbol on top of a
//! [`TickSource`]. Every registered stream carries a generation number; a
//! [`Subscription`] removes its registry entry only when the entry still has the
//! same generation, so a stale subscription left over from before a resubscribe
//! cannot cancel the newer stream.
//!
//! Handles are always stopped outside the registry lock, so a callback that
//! touches the registry cannot deadlock against a concurrent stop.

use crate::lock;
use super::tick_generator::{FeedHandle, TickSource};
use log::{debug, info};
use market_common::{Quote, Result, Tick};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

struct Entry<H> {
    generation: u64,
    handle: Arc<H>,
}

type Entries<H> = Mutex<HashMap<String, Entry<H>>>;

/// Tracks one active stream per symbol.
pub struct SubscriptionRegistry<S: TickSource> {
    source: S,
    entries: Arc<Entries<S::Handle>>,
    next_generation: AtomicU64,
}

impl<S: TickSource> SubscriptionRegistry<S> {
    /// Creates an empty registry on top of `source`.
    pub fn new(source: S) -> Self {
        SubscriptionRegistry {
            source,
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Underlying tick source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Opens a stream for `symbol`, stopping any stream already registered for it.
    ///
    /// The symbol is not checked against any catalog. A failure to start the new
    /// stream is returned as is; the previous stream has already been stopped.
    pub fn subscribe<F>(&self, symbol: &str, on_tick: F) -> Result<Subscription<S::Handle>>
    where
        F: FnMut(Tick) + Send + 'static,
    {
        self.register(symbol, |source| source.start(symbol, on_tick))
    }

    /// Like [`SubscriptionRegistry::subscribe`], but the stream continues from
    /// `quote` (see [`TickSource::resume`]).
    pub fn subscribe_from<F>(&self, quote: &Quote, on_tick: F) -> Result<Subscription<S::Handle>>
    where
        F: FnMut(Tick) + Send + 'static,
    {
        self.register(&quote.symbol, |source| source.resume(quote, on_tick))
    }

    fn register(
        &self,
        symbol: &str,
        start: impl FnOnce(&S) -> Result<S::Handle>,
    ) -> Result<Subscription<S::Handle>> {
        let previous = lock(&self.entries).remove(symbol);
        if let Some(previous) = previous {
            debug!(
                "Replacing subscription for {} (generation {})",
                symbol, previous.generation
            );
            previous.handle.stop();
        }

        let handle = Arc::new(start(&self.source)?);
        let generation = self.next_generation.fetch_add(1, Ordering::AcqRel) + 1;

        let displaced = lock(&self.entries).insert(
            symbol.to_string(),
            Entry {
                generation,
                handle: Arc::clone(&handle),
            },
        );
        // A concurrent subscribe for the same symbol got in between.
        if let Some(displaced) = displaced {
            displaced.handle.stop();
        }

        debug!("Subscribed to {} (generation {})", symbol, generation);
        Ok(Subscription {
            symbol: symbol.to_string(),
            generation,
            handle,
            entries: Arc::downgrade(&self.entries),
        })
    }

    /// Stops every registered stream and clears the registry. No-op when empty.
    pub fn unsubscribe_all(&self) {
        let drained: Vec<(String, Entry<S::Handle>)> = lock(&self.entries).drain().collect();
        if drained.is_empty() {
            return;
        }
        for (symbol, entry) in &drained {
            debug!("Stopping {} (generation {})", symbol, entry.generation);
            entry.handle.stop();
        }
        info!("Unsubscribed from {} stream(s)", drained.len());
    }

    /// Whether a stream is registered for `symbol`.
    pub fn is_subscribed(&self, symbol: &str) -> bool {
        lock(&self.entries).contains_key(symbol)
    }

    /// Symbols with a registered stream, sorted.
    pub fn active_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = lock(&self.entries).keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Number of registered streams.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// True when no stream is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: TickSource> Drop for SubscriptionRegistry<S> {
    fn drop(&mut self) {
        self.unsubscribe_all();
    }
}

/// One registered stream, returned by [`SubscriptionRegistry::subscribe`].
pub struct Subscription<H: FeedHandle> {
    symbol: String,
    generation: u64,
    handle: Arc<H>,
    entries: Weak<Entries<H>>,
}

impl<H: FeedHandle> Subscription<H> {
    /// Symbol of the stream.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Registry generation this subscription was created with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the underlying stream is still delivering.
    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    /// Stops this stream and removes its registry entry if the entry still
    /// belongs to this subscription. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        self.handle.stop();

        let Some(entries) = self.entries.upgrade() else {
            return;
        };
        let mut entries = lock(&entries);
        let current = entries
            .get(&self.symbol)
            .is_some_and(|entry| entry.generation == self.generation);
        if current {
            entries.remove(&self.symbol);
            debug!(
                "Unsubscribed from {} (generation {})",
                self.symbol, self.generation
            );
        }
    }
}
