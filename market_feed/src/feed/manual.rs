//! Push-driven tick source.
//!
//! `ManualFeed` delivers ticks that an outside producer hands to [`ManualFeed::push`]
//! (a network adapter, a replay file, or a test). Delivery happens synchronously on
//! the pushing thread, to every active stream for the tick's symbol.
//!
//! A stream must not be stopped from inside its own callback: `stop` waits for an
//! in-flight delivery to finish.

use crate::lock;
use super::tick_generator::{FeedHandle, TickSource};
use log::trace;
use market_common::{Result, Tick};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Sink = Box<dyn FnMut(Tick) + Send>;

struct ManualStream {
    symbol: String,
    active: AtomicBool,
    stop_calls: AtomicUsize,
    sink: Mutex<Sink>,
}

/// Tick source fed by explicit `push` calls.
#[derive(Clone, Default)]
pub struct ManualFeed {
    streams: Arc<Mutex<Vec<Arc<ManualStream>>>>,
    started: Arc<AtomicUsize>,
}

impl ManualFeed {
    /// Creates a feed with no streams.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `tick` to every active stream for its symbol and returns how many
    /// callbacks received it. Stopped streams are pruned.
    pub fn push(&self, tick: Tick) -> usize {
        let targets: Vec<Arc<ManualStream>> = {
            let mut streams = lock(&self.streams);
            streams.retain(|stream| stream.active.load(Ordering::Acquire));
            streams
                .iter()
                .filter(|stream| stream.symbol == tick.symbol)
                .cloned()
                .collect()
        };

        let mut delivered = 0;
        for stream in targets {
            let mut sink = lock(&stream.sink);
            if stream.active.load(Ordering::Acquire) {
                (*sink)(tick.clone());
                delivered += 1;
            }
        }
        trace!("Pushed {} tick to {} stream(s)", tick.symbol, delivered);
        delivered
    }

    /// Number of streams for `symbol` that are still active.
    pub fn active_streams(&self, symbol: &str) -> usize {
        lock(&self.streams)
            .iter()
            .filter(|stream| stream.symbol == symbol && stream.active.load(Ordering::Acquire))
            .count()
    }

    /// Total number of streams ever started on this feed.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::Acquire)
    }
}

impl TickSource for ManualFeed {
    type Handle = ManualHandle;

    fn start<F>(&self, symbol: &str, on_tick: F) -> Result<ManualHandle>
    where
        F: FnMut(Tick) + Send + 'static,
    {
        let stream = Arc::new(ManualStream {
            symbol: symbol.to_string(),
            active: AtomicBool::new(true),
            stop_calls: AtomicUsize::new(0),
            sink: Mutex::new(Box::new(on_tick)),
        });
        lock(&self.streams).push(Arc::clone(&stream));
        self.started.fetch_add(1, Ordering::AcqRel);
        Ok(ManualHandle { stream })
    }
}

/// Handle to one stream of a [`ManualFeed`].
pub struct ManualHandle {
    stream: Arc<ManualStream>,
}

impl ManualHandle {
    /// How many times `stop` has been called on this handle.
    pub fn stop_calls(&self) -> usize {
        self.stream.stop_calls.load(Ordering::Acquire)
    }
}

impl FeedHandle for ManualHandle {
    fn symbol(&self) -> &str {
        &self.stream.symbol
    }

    fn stop(&self) {
        self.stream.stop_calls.fetch_add(1, Ordering::AcqRel);
        self.stream.active.store(false, Ordering::Release);
        // Wait out a delivery that read the flag before it flipped.
        drop(lock(&self.stream.sink));
    }

    fn is_active(&self) -> bool {
        self.stream.active.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_only_to_matching_symbol() {
        let feed = ManualFeed::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _handle = feed
            .start("EURUSD", move |tick| sink.lock().unwrap().push(tick.price))
            .unwrap();

        assert_eq!(feed.push(Tick::new("EURUSD", 1.1, 0.0)), 1);
        assert_eq!(feed.push(Tick::new("GBPUSD", 1.3, 0.0)), 0);

        assert_eq!(*seen.lock().unwrap(), vec![1.1]);
    }

    #[test]
    fn stopped_stream_receives_nothing() {
        let feed = ManualFeed::new();
        let handle = feed.start("EURUSD", |_| panic!("stopped")).unwrap();

        handle.stop();
        handle.stop();

        assert_eq!(feed.push(Tick::new("EURUSD", 1.1, 0.0)), 0);
        assert_eq!(feed.active_streams("EURUSD"), 0);
        assert_eq!(handle.stop_calls(), 2);
        assert!(!handle.is_active());
    }
}
