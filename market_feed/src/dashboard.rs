//! Observed-instrument lifecycle.
//!
//! `MarketDashboard` ties the pieces together: it seeds the [`QuoteStore`] from the
//! instrument catalog, keeps exactly one live subscription for the selected
//! instrument, and routes every delivered tick into the store and the
//! [`WindowBuffer`].

use crate::feed::subscription::{Subscription, SubscriptionRegistry};
use crate::feed::tick_generator::TickSource;
use crate::init::{self, QuoteSeeder};
use crate::lock;
use crate::store::quote_store::QuoteStore;
use crate::store::window_buffer::WindowBuffer;
use log::info;
use market_common::instruments::find;
use market_common::{Instrument, MarketError, Quote, Result, Tick};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Owner of the quote list, the chart window and the selected subscription.
pub struct MarketDashboard<S: TickSource> {
    catalog: Vec<Instrument>,
    store: Arc<QuoteStore>,
    window: Arc<WindowBuffer>,
    registry: SubscriptionRegistry<S>,
    selection: Mutex<Option<Subscription<S::Handle>>>,
    delivered: Arc<AtomicU64>,
}

impl<S: TickSource> MarketDashboard<S> {
    pub fn new(source: S, catalog: Vec<Instrument>, window_capacity: usize) -> Self {
        MarketDashboard {
            catalog,
            store: Arc::new(QuoteStore::new()),
            window: Arc::new(WindowBuffer::new(window_capacity)),
            registry: SubscriptionRegistry::new(source),
            selection: Mutex::new(None),
            delivered: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Seeds a quote for every catalog instrument. Nothing is published on failure.
    pub fn initialize<Q: QuoteSeeder + ?Sized>(&self, seeder: &Q) -> Result<HashMap<String, Quote>> {
        init::initialize(&self.catalog, seeder, &self.store)
    }

    /// [`MarketDashboard::initialize`] with retry and linear backoff.
    pub fn initialize_with_retry<Q: QuoteSeeder + ?Sized>(
        &self,
        seeder: &Q,
        attempts: u32,
        backoff: Duration,
    ) -> Result<HashMap<String, Quote>> {
        init::initialize_with_retry(&self.catalog, seeder, &self.store, attempts, backoff)
    }

    /// Re-seeds all quotes while keeping the current subscription running.
    pub fn refresh<Q: QuoteSeeder + ?Sized>(&self, seeder: &Q) -> Result<HashMap<String, Quote>> {
        info!("Refreshing quotes");
        self.initialize(seeder)
    }

    /// Makes `symbol` the observed instrument.
    ///
    /// The previous subscription is stopped before the window is cleared, so the
    /// window only ever holds ticks of the selected instrument. Selecting the
    /// instrument that is already live is a no-op.
    pub fn select(&self, symbol: &str) -> Result<()> {
        let instrument = find(&self.catalog, symbol)
            .ok_or_else(|| MarketError::UnknownInstrument(symbol.to_string()))?;
        let symbol = instrument.symbol.clone();

        let mut selection = lock(&self.selection);
        if let Some(current) = selection.as_ref() {
            if current.symbol() == symbol && current.is_active() {
                return Ok(());
            }
        }
        if let Some(previous) = selection.take() {
            previous.unsubscribe();
        }
        self.window.reset();
        self.delivered.store(0, Ordering::Release);

        let store = Arc::clone(&self.store);
        let window = Arc::clone(&self.window);
        let delivered = Arc::clone(&self.delivered);
        let on_tick = move |tick: Tick| {
            store.merge(&tick);
            window.push(tick);
            delivered.fetch_add(1, Ordering::AcqRel);
        };
        // Continue from the seeded quote so the first tick does not jump.
        let subscription = match self.store.get(&symbol) {
            Some(quote) => self.registry.subscribe_from(&quote, on_tick)?,
            None => self.registry.subscribe(&symbol, on_tick)?,
        };
        *selection = Some(subscription);
        info!("Observing {}", symbol);
        Ok(())
    }

    /// Symbol of the observed instrument.
    pub fn selected(&self) -> Option<String> {
        lock(&self.selection)
            .as_ref()
            .map(|subscription| subscription.symbol().to_string())
    }

    /// All quotes in catalog order.
    pub fn quotes(&self) -> Vec<Quote> {
        self.store.get_all()
    }

    pub fn quote(&self, symbol: &str) -> Option<Quote> {
        self.store.get(symbol)
    }

    pub fn selected_quote(&self) -> Option<Quote> {
        self.selected().and_then(|symbol| self.store.get(&symbol))
    }

    /// Ticks delivered for the observed instrument since it was selected.
    pub fn ticks_delivered(&self) -> u64 {
        self.delivered.load(Ordering::Acquire)
    }

    /// Chart data for the observed instrument, oldest tick first.
    pub fn chart(&self) -> Vec<Tick> {
        self.window.snapshot()
    }

    /// Y-axis bounds of the chart.
    pub fn chart_range(&self) -> Option<(f64, f64)> {
        self.window.price_range()
    }

    /// Stops every stream and clears the selection. Safe to call repeatedly.
    pub fn shutdown(&self) {
        if let Some(subscription) = lock(&self.selection).take() {
            subscription.unsubscribe();
        }
        self.registry.unsubscribe_all();
    }

    pub fn catalog(&self) -> &[Instrument] {
        &self.catalog
    }

    pub fn store(&self) -> Arc<QuoteStore> {
        Arc::clone(&self.store)
    }

    pub fn window(&self) -> Arc<WindowBuffer> {
        Arc::clone(&self.window)
    }

    pub fn registry(&self) -> &SubscriptionRegistry<S> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::manual::ManualFeed;
    use crate::feed::tick_generator::TickGenerator;
    use crate::init::SyntheticSeeder;
    use market_common::instruments::default_catalog;
    use std::thread;
    use std::time::Instant;

    fn dashboard() -> (ManualFeed, MarketDashboard<ManualFeed>) {
        let feed = ManualFeed::new();
        let dashboard = MarketDashboard::new(feed.clone(), default_catalog(), 60);
        dashboard.initialize(&SyntheticSeeder).unwrap();
        (feed, dashboard)
    }

    #[test]
    fn ticks_reach_store_and_window() {
        let (feed, dashboard) = dashboard();
        dashboard.select("EURUSD").unwrap();

        feed.push(Tick::new("EURUSD", 1.1, 0.2));
        feed.push(Tick::new("EURUSD", 1.2, 0.3));

        let quote = dashboard.selected_quote().unwrap();
        assert_eq!(quote.price, 1.2);
        assert!(quote.updated);
        assert_eq!(dashboard.chart().len(), 2);
        assert_eq!(dashboard.chart_range(), Some((1.1, 1.2)));
    }

    #[test]
    fn switching_resets_window_and_stops_old_stream() {
        let (feed, dashboard) = dashboard();
        dashboard.select("EURUSD").unwrap();
        feed.push(Tick::new("EURUSD", 1.1, 0.0));

        dashboard.select("gbpusd").unwrap();
        feed.push(Tick::new("EURUSD", 1.5, 0.0));
        feed.push(Tick::new("GBPUSD", 1.3, 0.0));

        assert_eq!(dashboard.selected().as_deref(), Some("GBPUSD"));
        assert_eq!(feed.active_streams("EURUSD"), 0);
        let chart = dashboard.chart();
        assert_eq!(chart.len(), 1);
        assert_eq!(chart[0].symbol, "GBPUSD");
        assert_eq!(dashboard.quote("EURUSD").unwrap().price, 1.1);
    }

    #[test]
    fn counts_delivered_ticks_per_selection() {
        let (feed, dashboard) = dashboard();
        dashboard.select("EURUSD").unwrap();
        for price in [1.1, 1.2, 1.3] {
            feed.push(Tick::new("EURUSD", price, 0.0));
        }
        assert_eq!(dashboard.ticks_delivered(), 3);

        dashboard.select("GBPUSD").unwrap();
        assert_eq!(dashboard.ticks_delivered(), 0);
        feed.push(Tick::new("GBPUSD", 1.3, 0.0));
        assert_eq!(dashboard.ticks_delivered(), 1);
    }

    #[test]
    fn tick_count_passes_window_capacity() {
        let feed = ManualFeed::new();
        let dashboard = MarketDashboard::new(feed.clone(), default_catalog(), 2);
        dashboard.select("USDCAD").unwrap();
        for step in 0..5 {
            feed.push(Tick::new("USDCAD", 1.36 + f64::from(step) * 0.001, 0.0));
        }

        assert_eq!(dashboard.chart().len(), 2);
        assert_eq!(dashboard.ticks_delivered(), 5);
    }

    #[test]
    fn generated_ticks_continue_from_seeded_quote() {
        let dashboard = MarketDashboard::new(
            TickGenerator::new(Duration::from_millis(5)),
            default_catalog(),
            60,
        );
        dashboard.initialize(&SyntheticSeeder).unwrap();
        let seeded = dashboard.quote("EURUSD").unwrap();
        dashboard.select("EURUSD").unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while dashboard.chart().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        dashboard.shutdown();

        let first = dashboard.chart()[0].clone();
        assert!((first.price / seeded.price - 1.0).abs() <= 0.0005 + 1e-12);
        assert!((first.change - seeded.change).abs() < 0.1);
    }

    #[test]
    fn reselecting_live_symbol_keeps_stream() {
        let (feed, dashboard) = dashboard();
        dashboard.select("USDJPY").unwrap();
        feed.push(Tick::new("USDJPY", 150.0, 0.0));

        dashboard.select("USDJPY").unwrap();

        assert_eq!(feed.started(), 1);
        assert_eq!(dashboard.chart().len(), 1);
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let (feed, dashboard) = dashboard();
        dashboard.select("EURUSD").unwrap();

        let result = dashboard.select("XAUUSD");

        assert!(matches!(result, Err(MarketError::UnknownInstrument(_))));
        assert_eq!(dashboard.selected().as_deref(), Some("EURUSD"));
        assert_eq!(feed.active_streams("EURUSD"), 1);
    }

    #[test]
    fn refresh_keeps_subscription() {
        let (feed, dashboard) = dashboard();
        dashboard.select("AUDUSD").unwrap();

        dashboard.refresh(&SyntheticSeeder).unwrap();
        feed.push(Tick::new("AUDUSD", 0.66, 0.0));

        assert_eq!(dashboard.quote("AUDUSD").unwrap().price, 0.66);
        assert_eq!(dashboard.quotes().len(), 6);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let (feed, dashboard) = dashboard();
        dashboard.select("NZDUSD").unwrap();

        dashboard.shutdown();
        dashboard.shutdown();

        assert!(dashboard.selected().is_none());
        assert!(dashboard.registry().is_empty());
        assert_eq!(feed.push(Tick::new("NZDUSD", 0.6, 0.0)), 0);
    }
}
