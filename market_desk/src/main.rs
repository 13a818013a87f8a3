//! Market Desk, a terminal front end for the market feed core.
//!
//! It seeds a quote for every configured instrument, observes one of them through a
//! live tick stream, and prints the selected quote together with the bounds of its
//! rolling chart window. It also shows exchange sessions and manages a small
//! portfolio file.
//!
//! Usage example (CLI):
//! ```bash
//! market_desk watch --symbol GBPUSD --interval-ms 500 --window 120
//! market_desk watch --instruments ./pairs.txt --ticks 30 --json
//! market_desk exchanges
//! market_desk portfolio --file ./portfolio.json add --symbol EURUSD --quantity 1000 --entry-price 1.08
//! ```
//!
//! The instrument file holds one `SYMBOL[,Name[,Flag]]` per line.
//! See `market_common::instruments` for details.
mod args;
mod portfolio;

use crate::args::{Args, DeskCommand, PortfolioAction, WatchArgs};
use crate::portfolio::{JsonFileStore, Portfolio};
use chrono::Utc;
use clap::Parser;
use crossbeam_channel::tick;
use log::{error, info};
use market_common::exchange::{exchanges, format_duration};
use market_common::instruments::{InstrumentParser, default_catalog};
use market_common::{Instrument, MarketError, Quote, Result};
use market_feed::{MarketDashboard, SyntheticSeeder, TickGenerator, TickSource};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

/// One rendered frame of the `watch` command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Frame<'a> {
    quote: &'a Quote,
    window_len: usize,
    window_low: Option<f64>,
    window_high: Option<f64>,
}

fn main() {
    init_logger();
    let args = Args::parse();

    let result = match args.command {
        DeskCommand::Watch(watch) => run_watch(&watch),
        DeskCommand::Exchanges => {
            print_exchanges();
            Ok(())
        }
        DeskCommand::Portfolio { file, action } => run_portfolio(&file, action),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run_watch(watch: &WatchArgs) -> Result<()> {
    let config = watch.feed_args().normalize()?;
    let catalog = load_catalog(watch)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .expect("Error setting Ctrl+C handler");
    }

    let dashboard = MarketDashboard::new(
        TickGenerator::new(config.tick_interval),
        catalog,
        config.window_capacity,
    );
    dashboard.initialize_with_retry(&SyntheticSeeder, config.init_attempts, config.init_backoff)?;
    dashboard.select(&config.symbol)?;
    info!("Watching {}. Press Ctrl+C to exit.", config.symbol);

    let result = watch_loop(&dashboard, config.tick_interval, watch, &shutdown);
    dashboard.shutdown();
    result.map(|_| ())
}

fn watch_loop<S: TickSource>(
    dashboard: &MarketDashboard<S>,
    tick_interval: Duration,
    watch: &WatchArgs,
    shutdown: &AtomicBool,
) -> Result<u64> {
    // Poll twice per tick; frames render only when new ticks have arrived.
    let refresh = tick((tick_interval / 2).max(Duration::from_millis(1)));
    let mut rendered = 0u64;

    while !shutdown.load(Ordering::SeqCst) {
        refresh.recv()?;

        let delivered = dashboard.ticks_delivered();
        if delivered == rendered {
            continue;
        }
        rendered = delivered;

        if let Some(quote) = dashboard.selected_quote() {
            render(&quote, dashboard.chart_range(), dashboard.chart().len(), watch.json)?;
        }
        if watch.ticks.is_some_and(|limit| delivered >= limit) {
            info!("Seen {} tick(s), stopping", delivered);
            break;
        }
    }
    Ok(rendered)
}

fn render(quote: &Quote, range: Option<(f64, f64)>, window_len: usize, json: bool) -> Result<()> {
    if json {
        let frame = Frame {
            quote,
            window_len,
            window_low: range.map(|(low, _)| low),
            window_high: range.map(|(_, high)| high),
        };
        println!("{}", serde_json::to_string(&frame)?);
        return Ok(());
    }

    let arrow = if quote.is_up() { "▲" } else { "▼" };
    let (low, high) = range.unwrap_or((quote.price, quote.price));
    println!(
        "{} {} {:.5} {} {:+.2}%  window[{}] {:.5}..{:.5}  {}",
        quote.name,
        quote.flag.as_deref().unwrap_or(""),
        quote.price,
        arrow,
        quote.change,
        window_len,
        low,
        high,
        quote.timestamp.format("%H:%M:%S")
    );
    Ok(())
}

fn load_catalog(watch: &WatchArgs) -> Result<Vec<Instrument>> {
    let Some(path) = watch.instruments_path() else {
        return Ok(default_catalog());
    };
    if !path.is_file() {
        return Err(MarketError::Config(format!(
            "instrument file {} does not exist",
            path.display()
        )));
    }
    let file = File::open(&path)?;
    let instruments = Instrument::parse_from_file(BufReader::new(file))?;
    info!("Loaded {} instrument(s) from {}", instruments.len(), path.display());
    Ok(instruments)
}

fn print_exchanges() {
    let now = Utc::now();
    for exchange in exchanges() {
        let status = exchange.status(now);
        println!(
            "{:<9} {:<15} {}-{} {:<20} {:<6} {} in {}",
            exchange.name,
            exchange.country,
            exchange.open_time(),
            exchange.close_time(),
            exchange.timezone,
            if status.is_open { "OPEN" } else { "CLOSED" },
            status.next_event.kind,
            format_duration(status.next_event.time_until)
        );
    }
}

fn run_portfolio(file: &str, action: PortfolioAction) -> Result<()> {
    let mut portfolio = Portfolio::open(JsonFileStore::new(args::normalize_path(file)))?;
    match action {
        PortfolioAction::List => {
            for position in portfolio.positions() {
                println!(
                    "{:>14} {:<8} {:>12.2} @ {:.5} = {:.2}",
                    position.id,
                    position.symbol,
                    position.quantity,
                    position.entry_price,
                    position.invested()
                );
            }
            println!("Total: {:.2}", portfolio.total_value());
        }
        PortfolioAction::Add {
            symbol,
            quantity,
            entry_price,
        } => {
            let position = portfolio.add(&symbol, quantity, entry_price)?;
            println!("Added {} ({})", position.id, position.symbol);
        }
        PortfolioAction::Remove { id } => {
            let position = portfolio.remove(id)?;
            println!("Removed {} ({})", position.id, position.symbol);
        }
    }
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
