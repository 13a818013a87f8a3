//! Instrument identities and the catalog helpers shared by the feed and the desk.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::BufRead;

use crate::error::MarketError;

/// Tradable instrument tracked by the dashboard. Immutable once configured.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique key, e.g. `EURUSD`.
    pub symbol: String,
    /// Display name, e.g. `EUR/USD`.
    pub name: String,
    /// Optional label shown next to the name (a flag pair for currencies).
    pub flag: Option<String>,
}

impl Instrument {
    /// Creates an instrument with a display name and no label.
    pub fn new(symbol: &str, name: &str) -> Self {
        Instrument {
            symbol: symbol.to_string(),
            name: name.to_string(),
            flag: None,
        }
    }

    /// Attaches a display label.
    pub fn with_flag(mut self, flag: &str) -> Self {
        self.flag = Some(flag.to_string());
        self
    }
}

/// Six major currency pairs the dashboard observes when no catalog file is given.
pub fn default_catalog() -> Vec<Instrument> {
    vec![
        Instrument::new("EURUSD", "EUR/USD").with_flag("🇪🇺🇺🇸"),
        Instrument::new("GBPUSD", "GBP/USD").with_flag("🇬🇧🇺🇸"),
        Instrument::new("USDJPY", "USD/JPY").with_flag("🇺🇸🇯🇵"),
        Instrument::new("AUDUSD", "AUD/USD").with_flag("🇦🇺🇺🇸"),
        Instrument::new("USDCAD", "USD/CAD").with_flag("🇺🇸🇨🇦"),
        Instrument::new("NZDUSD", "NZD/USD").with_flag("🇳🇿🇺🇸"),
    ]
}

/// Looks up an instrument by symbol, ignoring ASCII case.
pub fn find<'a>(catalog: &'a [Instrument], symbol: &str) -> Option<&'a Instrument> {
    catalog
        .iter()
        .find(|instrument| instrument.symbol.eq_ignore_ascii_case(symbol))
}

/// Trait providing file parsing for instrument catalogs.
pub trait InstrumentParser {
    /// Parses instruments from a buffered reader.
    ///
    /// Each non-empty line is `SYMBOL[,Name[,Flag]]`; lines starting with `#` are
    /// comments. The symbol is uppercased and must be ASCII alphanumeric. When the
    /// name is omitted the symbol doubles as the display name. Duplicate symbols
    /// are rejected so the catalog order stays unambiguous.
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Instrument>, MarketError>;
}

impl InstrumentParser for Instrument {
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Self>, MarketError> {
        let mut instruments = Vec::new();
        let mut seen = HashSet::new();

        for (index, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(MarketError::Io)?;
            let trimmed_line = line.trim();
            if trimmed_line.is_empty() || trimmed_line.starts_with('#') {
                continue;
            }

            let mut fields = trimmed_line.splitn(3, ',').map(str::trim);
            let symbol = fields.next().unwrap_or_default().to_ascii_uppercase();
            if symbol.is_empty() || !symbol.chars().all(|ch| ch.is_ascii_alphanumeric()) {
                return Err(MarketError::ParseCatalog(format!(
                    "line {}: symbol must be non-empty alphanumeric ASCII, got '{}'",
                    index + 1,
                    symbol
                )));
            }
            if !seen.insert(symbol.clone()) {
                return Err(MarketError::ParseCatalog(format!(
                    "line {}: duplicate symbol {}",
                    index + 1,
                    symbol
                )));
            }

            let name = match fields.next() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => symbol.clone(),
            };
            let flag = fields
                .next()
                .filter(|flag| !flag.is_empty())
                .map(str::to_string);

            instruments.push(Instrument { symbol, name, flag });
        }

        if instruments.is_empty() {
            return Err(MarketError::ParseCatalog(
                "catalog contains no instruments".to_string(),
            ));
        }
        Ok(instruments)
    }
}
