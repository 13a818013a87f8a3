use crossbeam_channel::unbounded;
use market_common::{Instrument, Tick};
use market_feed::{
    FeedHandle, ManualFeed, MarketDashboard, QuoteStore, SubscriptionRegistry, SyntheticSeeder,
    TickGenerator, TickSource, WindowBuffer, initialize,
};
use std::sync::Arc;
use std::time::Duration;

fn pairs() -> Vec<Instrument> {
    vec![
        Instrument::new("EURUSD", "EUR/USD"),
        Instrument::new("GBPUSD", "GBP/USD"),
    ]
}

#[test]
fn seeded_pair_follows_three_ticks() {
    let feed = ManualFeed::new();
    let store = Arc::new(QuoteStore::new());
    let window = Arc::new(WindowBuffer::new(60));
    let registry = SubscriptionRegistry::new(feed.clone());

    let seeded = initialize(&pairs(), &SyntheticSeeder, &store).unwrap();
    assert_eq!(seeded.len(), 2);
    for quote in store.get_all() {
        assert!(quote.price > 0.0);
        assert!(quote.high.is_some() && quote.low.is_some());
    }
    let seeded_high = store.get("EURUSD").unwrap().high;

    let (sink_store, sink_window) = (Arc::clone(&store), Arc::clone(&window));
    let _subscription = registry
        .subscribe("EURUSD", move |tick| {
            sink_store.merge(&tick);
            sink_window.push(tick);
        })
        .unwrap();
    for price in [1.1, 1.2, 1.3] {
        feed.push(Tick::new("EURUSD", price, 0.0));
    }

    let quote = store.get("EURUSD").unwrap();
    assert_eq!(quote.price, 1.3);
    assert_eq!(quote.high, seeded_high);
    let prices: Vec<f64> = window.snapshot().iter().map(|t| t.price).collect();
    assert_eq!(prices, vec![1.1, 1.2, 1.3]);
}

#[test]
fn double_subscribe_leaves_one_live_stream() {
    let feed = ManualFeed::new();
    let registry = SubscriptionRegistry::new(feed.clone());
    let (first_tx, first_rx) = unbounded();
    let (second_tx, second_rx) = unbounded();

    let first = registry
        .subscribe("EURUSD", move |tick: Tick| {
            let _ = first_tx.send(tick.price);
        })
        .unwrap();
    let second = registry
        .subscribe("EURUSD", move |tick: Tick| {
            let _ = second_tx.send(tick.price);
        })
        .unwrap();

    feed.push(Tick::new("EURUSD", 1.25, 0.0));

    assert_eq!(feed.active_streams("EURUSD"), 1);
    assert!(!first.is_active());
    assert!(second.is_active());
    assert!(first_rx.try_recv().is_err());
    assert_eq!(second_rx.try_recv().unwrap(), 1.25);
}

#[test]
fn generator_drives_dashboard() {
    let dashboard = MarketDashboard::new(
        TickGenerator::new(Duration::from_millis(5)),
        pairs(),
        5,
    );
    dashboard.initialize(&SyntheticSeeder).unwrap();
    dashboard.select("GBPUSD").unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while dashboard.chart().len() < 5 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    dashboard.shutdown();

    let chart = dashboard.chart();
    assert_eq!(chart.len(), 5);
    assert!(chart.iter().all(|tick| tick.symbol == "GBPUSD"));
    assert!(dashboard.quote("GBPUSD").unwrap().updated);
    assert!(!dashboard.quote("EURUSD").unwrap().updated);

    let frozen = dashboard.chart();
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(dashboard.chart(), frozen);
}

#[test]
fn generator_stream_stops_when_handle_drops() {
    let (tx, rx) = unbounded();
    let handle = TickGenerator::new(Duration::from_millis(5))
        .start("USDCAD", move |tick: Tick| {
            let _ = tx.send(tick);
        })
        .unwrap();
    let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(first.symbol, handle.symbol());

    drop(handle);
    while rx.try_recv().is_ok() {}

    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
}
