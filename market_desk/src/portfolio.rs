//! Locally persisted portfolio of open positions.
//!
//! Positions are kept as a JSON array on disk. A missing or empty file reads as
//! an empty portfolio.

use chrono::{DateTime, Utc};
use log::{debug, info};
use market_common::{MarketError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// One recorded position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Creation time in milliseconds since the epoch, unique within a portfolio.
    pub id: i64,
    pub symbol: String,
    pub quantity: f64,
    pub entry_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    /// Amount paid for the position.
    pub fn invested(&self) -> f64 {
        self.quantity * self.entry_price
    }
}

/// Storage backend for the position list.
pub trait PositionStore {
    fn load(&self) -> Result<Vec<Position>>;
    fn save(&self, positions: &[Position]) -> Result<()>;
}

/// Stores positions as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }
}

impl PositionStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Position>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read(&self.path)?;
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&raw)?)
    }

    fn save(&self, positions: &[Position]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(positions)?)?;
        debug!("Saved {} position(s) to {}", positions.len(), self.path.display());
        Ok(())
    }
}

/// In-memory view of the stored positions; every change is written through.
pub struct Portfolio<S: PositionStore> {
    store: S,
    positions: Vec<Position>,
}

impl<S: PositionStore> Portfolio<S> {
    /// Loads the current positions from `store`.
    pub fn open(store: S) -> Result<Self> {
        let positions = store.load()?;
        Ok(Portfolio { store, positions })
    }

    /// Validates and records a new position.
    ///
    /// The symbol is trimmed and uppercased; quantity and entry price must be
    /// finite and positive.
    pub fn add(&mut self, symbol: &str, quantity: f64, entry_price: f64) -> Result<Position> {
        let symbol = symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return Err(MarketError::InvalidPosition("symbol is required".to_string()));
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(MarketError::InvalidPosition(format!(
                "quantity must be positive, got {quantity}"
            )));
        }
        if !entry_price.is_finite() || entry_price <= 0.0 {
            return Err(MarketError::InvalidPosition(format!(
                "entry price must be positive, got {entry_price}"
            )));
        }

        let timestamp = Utc::now();
        let mut id = timestamp.timestamp_millis();
        if let Some(max) = self.positions.iter().map(|p| p.id).max() {
            id = id.max(max + 1);
        }

        let position = Position {
            id,
            symbol,
            quantity,
            entry_price,
            timestamp,
        };
        let mut updated = self.positions.clone();
        updated.push(position.clone());
        self.store.save(&updated)?;
        self.positions = updated;
        info!("Added position {} ({})", position.id, position.symbol);
        Ok(position)
    }

    /// Deletes the position with `id` and returns it.
    pub fn remove(&mut self, id: i64) -> Result<Position> {
        let index = self
            .positions
            .iter()
            .position(|p| p.id == id)
            .ok_or(MarketError::PositionNotFound(id))?;
        let mut updated = self.positions.clone();
        let removed = updated.remove(index);
        self.store.save(&updated)?;
        self.positions = updated;
        info!("Removed position {}", id);
        Ok(removed)
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Sum of `quantity * entry_price` over all positions.
    pub fn total_value(&self) -> f64 {
        self.positions.iter().map(Position::invested).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_an_empty_portfolio() {
        let dir = tempdir().unwrap();
        let portfolio = Portfolio::open(JsonFileStore::new(dir.path().join("none.json"))).unwrap();
        assert!(portfolio.positions().is_empty());
        assert_eq!(portfolio.total_value(), 0.0);
    }

    #[test]
    fn positions_survive_reopen() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("nested").join("portfolio.json");

        let mut portfolio = Portfolio::open(JsonFileStore::new(file.clone())).unwrap();
        let first = portfolio.add(" eurusd ", 1000.0, 1.08).unwrap();
        let second = portfolio.add("GBPUSD", 500.0, 1.25).unwrap();
        assert_eq!(first.symbol, "EURUSD");
        assert!(second.id > first.id);

        let reopened = Portfolio::open(JsonFileStore::new(file)).unwrap();
        assert_eq!(reopened.positions(), portfolio.positions());
        assert!((reopened.total_value() - 1705.0).abs() < 1e-9);
    }

    #[test]
    fn stores_camel_case_json() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("portfolio.json");
        let mut portfolio = Portfolio::open(JsonFileStore::new(file.clone())).unwrap();
        portfolio.add("USDJPY", 10.0, 150.0).unwrap();

        let raw = fs::read_to_string(file).unwrap();
        assert!(raw.contains("\"entryPrice\""));
    }

    #[test]
    fn rejects_invalid_input() {
        let dir = tempdir().unwrap();
        let mut portfolio = Portfolio::open(JsonFileStore::new(dir.path().join("p.json"))).unwrap();

        for (symbol, quantity, price) in [("", 1.0, 1.0), ("EURUSD", 0.0, 1.0), ("EURUSD", 1.0, f64::NAN)] {
            assert!(matches!(
                portfolio.add(symbol, quantity, price),
                Err(MarketError::InvalidPosition(_))
            ));
        }
        assert!(portfolio.positions().is_empty());
    }

    #[test]
    fn remove_unknown_id_fails() {
        let dir = tempdir().unwrap();
        let mut portfolio = Portfolio::open(JsonFileStore::new(dir.path().join("p.json"))).unwrap();
        let position = portfolio.add("AUDUSD", 100.0, 0.66).unwrap();

        assert!(matches!(portfolio.remove(42), Err(MarketError::PositionNotFound(42))));
        assert_eq!(portfolio.remove(position.id).unwrap(), position);
        assert!(portfolio.positions().is_empty());
    }
}
