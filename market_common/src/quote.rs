//! Tick and quote data model.
//!
//! A `Tick` is one timestamped price observation emitted by a tick source. A
//! `Quote` is the latest aggregated state for an instrument; ticks are folded
//! into it field by field (see [`Quote::apply_tick`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::instruments::Instrument;

/// Single price observation for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tick {
    /// Symbol the observation belongs to.
    pub symbol: String,
    /// Last price.
    pub price: f64,
    /// Percent change reported alongside the price.
    pub change: f64,
    /// Session high, when the source reports one.
    pub high: Option<f64>,
    /// Session low, when the source reports one.
    pub low: Option<f64>,
    /// Observation time.
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    /// Creates a tick without high/low, timestamped now.
    pub fn new(symbol: &str, price: f64, change: f64) -> Self {
        Tick {
            symbol: symbol.to_string(),
            price,
            change,
            high: None,
            low: None,
            timestamp: Utc::now(),
        }
    }

    /// Adds session high/low to the tick.
    pub fn with_range(mut self, high: f64, low: f64) -> Self {
        self.high = Some(high);
        self.low = Some(low);
        self
    }
}

/// Latest known market state for one instrument.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub flag: Option<String>,
    pub price: f64,
    /// Percent change.
    pub change: f64,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub timestamp: DateTime<Utc>,
    /// Set once the quote has received at least one live tick.
    pub updated: bool,
}

impl Quote {
    /// Builds a seeded quote for a configured instrument.
    pub fn seeded(instrument: &Instrument, price: f64, change: f64, high: f64, low: f64) -> Self {
        Quote {
            symbol: instrument.symbol.clone(),
            name: instrument.name.clone(),
            flag: instrument.flag.clone(),
            price,
            change,
            high: Some(high),
            low: Some(low),
            timestamp: Utc::now(),
            updated: false,
        }
    }

    /// Builds a quote for a symbol that had no prior state; the symbol doubles as its name.
    pub fn from_tick(tick: &Tick) -> Self {
        Quote {
            symbol: tick.symbol.clone(),
            name: tick.symbol.clone(),
            flag: None,
            price: tick.price,
            change: tick.change,
            high: tick.high,
            low: tick.low,
            timestamp: tick.timestamp,
            updated: true,
        }
    }

    /// Overlays a tick onto this quote.
    ///
    /// | field                | rule                               |
    /// |----------------------|------------------------------------|
    /// | `price`, `change`    | overwrite                          |
    /// | `high`, `low`        | overwrite if present, else keep    |
    /// | `timestamp`          | overwrite                          |
    /// | `updated`            | always `true`                      |
    /// | `symbol`, `name`, `flag` | keep                           |
    pub fn apply_tick(&mut self, tick: &Tick) {
        self.price = tick.price;
        self.change = tick.change;
        if let Some(high) = tick.high {
            self.high = Some(high);
        }
        if let Some(low) = tick.low {
            self.low = Some(low);
        }
        self.timestamp = tick.timestamp;
        self.updated = true;
    }

    /// True when the percent change is non-negative.
    pub fn is_up(&self) -> bool {
        self.change >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Quote {
        let instrument = Instrument::new("EURUSD", "EUR/USD").with_flag("EU");
        Quote::seeded(&instrument, 1.08, 0.4, 1.09, 1.07)
    }

    #[test]
    fn tick_without_range_keeps_high_and_low() {
        let mut quote = seeded();
        let tick = Tick::new("EURUSD", 1.5, -2.0);

        quote.apply_tick(&tick);

        assert_eq!(quote.price, 1.5);
        assert_eq!(quote.change, -2.0);
        assert_eq!(quote.high, Some(1.09));
        assert_eq!(quote.low, Some(1.07));
        assert_eq!(quote.timestamp, tick.timestamp);
        assert!(quote.updated);
    }

    #[test]
    fn full_tick_overwrites_every_market_field() {
        let mut quote = seeded();
        let tick = Tick::new("EURUSD", 1.2, 3.0).with_range(1.3, 1.1);

        quote.apply_tick(&tick);

        assert_eq!(quote.price, 1.2);
        assert_eq!(quote.change, 3.0);
        assert_eq!(quote.high, Some(1.3));
        assert_eq!(quote.low, Some(1.1));
        assert_eq!(quote.name, "EUR/USD");
        assert_eq!(quote.flag.as_deref(), Some("EU"));
    }

    #[test]
    fn quote_from_tick_uses_symbol_as_name() {
        let quote = Quote::from_tick(&Tick::new("XAUUSD", 2400.0, 0.1));
        assert_eq!(quote.name, "XAUUSD");
        assert!(quote.updated);
        assert_eq!(quote.high, None);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(seeded()).unwrap();
        assert!(json.get("updated").is_some());
        assert_eq!(json["symbol"], "EURUSD");
    }
}
