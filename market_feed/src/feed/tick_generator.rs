//! Periodic synthetic tick source.
//!
//! `TickGenerator` starts one worker thread per symbol. The worker waits on a
//! `crossbeam_channel::tick` timer and a stop channel with `select!`, and on every
//! period invokes the subscriber callback with a freshly generated `Tick`.
//!
//! Delivery contract (shared by every [`TickSource`]):
//! - one tick per period, delivered in generation order;
//! - no delivery after [`FeedHandle::stop`] returns;
//! - `stop` is idempotent.
//!
//! Prices follow a small random walk around an opening price sampled uniformly
//! from `[0.5, 2.5)`; `change` is the percent move since that opening price.
//! [`TickSource::resume`] continues the walk from an existing quote instead.

use crate::lock;
use crossbeam_channel::{Sender, bounded, select, tick};
use log::{debug, info, trace, warn};
use market_common::config::DEFAULT_TICK_INTERVAL_MS;
use market_common::{MarketError, Quote, Result, Tick};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

/// Lowest price the walk may reach.
const MIN_PRICE: f64 = 0.0001;
/// Largest relative move per tick (±0.05%).
const MAX_STEP: f64 = 0.0005;
const OPENING_PRICE_MIN: f64 = 0.5;
const OPENING_PRICE_MAX: f64 = 2.5;

/// Handle to one running stream of ticks.
pub trait FeedHandle: Send + Sync + 'static {
    /// Symbol this stream produces ticks for.
    fn symbol(&self) -> &str;

    /// Stops delivery. Once this returns, the callback is never invoked again.
    /// Calling it on an already stopped handle is a no-op.
    fn stop(&self);

    /// Whether the stream is still delivering.
    fn is_active(&self) -> bool;
}

/// Anything that can push ticks for a symbol to a callback: the local generator,
/// a manual/replay feed, or a network adapter.
pub trait TickSource: Send + Sync {
    /// Handle type returned for each started stream.
    type Handle: FeedHandle;

    /// Starts delivering ticks for `symbol` to `on_tick`.
    ///
    /// Returns `MarketError::Subscription` when the stream cannot be started.
    fn start<F>(&self, symbol: &str, on_tick: F) -> Result<Self::Handle>
    where
        F: FnMut(Tick) + Send + 'static;

    /// Starts a stream for `quote.symbol` that continues from `quote`'s price and
    /// change. Sources that do not synthesize prices ignore the quote.
    fn resume<F>(&self, quote: &Quote, on_tick: F) -> Result<Self::Handle>
    where
        F: FnMut(Tick) + Send + 'static,
    {
        self.start(&quote.symbol, on_tick)
    }
}

/// Bounded random walk used for synthetic prices.
#[derive(Debug, Clone)]
pub struct PriceWalk {
    opening: f64,
    last: f64,
}

impl PriceWalk {
    /// Starts a walk at a uniformly sampled opening price.
    pub fn new() -> Self {
        let mut rng = rand::rng();
        Self::starting_at(rng.random_range(OPENING_PRICE_MIN..OPENING_PRICE_MAX))
    }

    /// Starts a walk at a fixed opening price.
    pub fn starting_at(opening: f64) -> Self {
        let opening = opening.max(MIN_PRICE);
        PriceWalk {
            opening,
            last: opening,
        }
    }

    /// Continues from `price`, which is already `change_percent` away from the
    /// opening price.
    pub fn resuming(price: f64, change_percent: f64) -> Self {
        let last = price.max(MIN_PRICE);
        let factor = 1.0 + change_percent / 100.0;
        let opening = if factor.is_finite() && factor > 0.0 {
            (last / factor).max(MIN_PRICE)
        } else {
            last
        };
        PriceWalk { opening, last }
    }

    /// Advances the walk by one step and returns the new price.
    pub fn next_price(&mut self) -> f64 {
        let mut rng = rand::rng();
        let step: f64 = rng.random_range(-MAX_STEP..MAX_STEP);
        self.last = (self.last * (1.0 + step)).max(MIN_PRICE);
        self.last
    }

    /// Percent change of the last price against the opening price.
    pub fn change_percent(&self) -> f64 {
        (self.last / self.opening - 1.0) * 100.0
    }

    /// Produces the next tick for `symbol`.
    pub fn next_tick(&mut self, symbol: &str) -> Tick {
        let price = self.next_price();
        Tick::new(symbol, price, self.change_percent())
    }
}

impl Default for PriceWalk {
    fn default() -> Self {
        Self::new()
    }
}

/// Synthetic tick source driven by a fixed period.
#[derive(Debug, Clone)]
pub struct TickGenerator {
    period: Duration,
}

impl TickGenerator {
    /// Creates a generator that emits one tick per `period`.
    pub fn new(period: Duration) -> Self {
        TickGenerator { period }
    }

    /// Emission period.
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for TickGenerator {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TICK_INTERVAL_MS))
    }
}

impl TickSource for TickGenerator {
    type Handle = GeneratorHandle;

    fn start<F>(&self, symbol: &str, on_tick: F) -> Result<GeneratorHandle>
    where
        F: FnMut(Tick) + Send + 'static,
    {
        self.spawn(symbol, PriceWalk::new(), on_tick)
    }

    fn resume<F>(&self, quote: &Quote, on_tick: F) -> Result<GeneratorHandle>
    where
        F: FnMut(Tick) + Send + 'static,
    {
        let walk = PriceWalk::resuming(quote.price, quote.change);
        self.spawn(&quote.symbol, walk, on_tick)
    }
}

impl TickGenerator {
    fn spawn<F>(&self, symbol: &str, mut walk: PriceWalk, mut on_tick: F) -> Result<GeneratorHandle>
    where
        F: FnMut(Tick) + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let stopped = Arc::new(AtomicBool::new(false));
        let worker_stopped = Arc::clone(&stopped);
        let ticker = tick(self.period);
        let worker_symbol = symbol.to_string();

        let join_handle = thread::Builder::new()
            .name(format!("ticks-{symbol}"))
            .spawn(move || {
                debug!("Tick worker for {} started", worker_symbol);
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            if worker_stopped.load(Ordering::Acquire) {
                                break;
                            }
                            let tick = walk.next_tick(&worker_symbol);
                            trace!("{} tick price={:.5} change={:.2}%", tick.symbol, tick.price, tick.change);
                            on_tick(tick);
                        }
                    }
                }
                debug!("Tick worker for {} stopped", worker_symbol);
            })
            .map_err(|e| MarketError::Subscription {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;

        info!(
            "Tick generator started for {} (period {:?})",
            symbol, self.period
        );
        Ok(GeneratorHandle {
            symbol: symbol.to_string(),
            stopped,
            worker_thread: join_handle.thread().id(),
            worker: Mutex::new(Some(Worker {
                stop_tx,
                thread: join_handle,
            })),
        })
    }
}

struct Worker {
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

/// Handle to one generator worker thread.
///
/// Dropping the handle stops the worker.
pub struct GeneratorHandle {
    symbol: String,
    stopped: Arc<AtomicBool>,
    worker_thread: ThreadId,
    worker: Mutex<Option<Worker>>,
}

impl FeedHandle for GeneratorHandle {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);

        // Called from inside the callback: the worker re-checks the flag before
        // the next delivery, and cannot join itself.
        if thread::current().id() == self.worker_thread {
            return;
        }

        let mut slot = lock(&self.worker);
        if let Some(worker) = slot.take() {
            drop(worker.stop_tx);
            if worker.thread.join().is_err() {
                warn!("Tick worker for {} panicked", self.symbol);
            }
            info!("Tick generator stopped for {}", self.symbol);
        }
    }

    fn is_active(&self) -> bool {
        !self.stopped.load(Ordering::Acquire)
    }
}

impl Drop for GeneratorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
