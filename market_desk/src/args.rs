//! Command-line arguments for the market desk.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::{Parser, Subcommand};
use market_common::config::FeedArgs;
use std::path::PathBuf;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: DeskCommand,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum DeskCommand {
    /// Stream live quotes for one instrument and draw its rolling window.
    Watch(WatchArgs),
    /// Show which exchanges are open right now.
    Exchanges,
    /// Manage the locally stored portfolio.
    Portfolio {
        /// JSON file holding the positions.
        #[arg(long, default_value = "portfolio.json")]
        file: String,

        #[command(subcommand)]
        action: PortfolioAction,
    },
}

/// Options of the `watch` command. Unset values fall back to the feed defaults.
#[derive(Debug, clap::Args)]
pub struct WatchArgs {
    /// Instrument to observe, e.g. EURUSD.
    #[arg(long)]
    pub symbol: Option<String>,

    /// Milliseconds between two generated ticks.
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Number of ticks kept in the chart window.
    #[arg(long)]
    pub window: Option<usize>,

    /// Path to an instrument catalog file, one `SYMBOL[,Name[,Flag]]` per line.
    #[arg(long)]
    pub instruments: Option<String>,

    /// Stop after this many ticks instead of running until Ctrl+C.
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Initialization attempts before giving up.
    #[arg(long)]
    pub init_attempts: Option<u32>,

    /// Print every update as a JSON line.
    #[arg(long)]
    pub json: bool,
}

impl WatchArgs {
    /// Raw feed settings, validated later by `FeedArgs::normalize`.
    pub fn feed_args(&self) -> FeedArgs {
        FeedArgs {
            symbol: self.symbol.clone(),
            tick_interval_ms: self.interval_ms,
            window_capacity: self.window,
            init_attempts: self.init_attempts,
        }
    }

    /// Catalog file path, if one was given.
    pub fn instruments_path(&self) -> Option<PathBuf> {
        self.instruments.as_deref().map(normalize_path)
    }
}

/// Portfolio subcommands.
#[derive(Debug, Subcommand)]
pub enum PortfolioAction {
    /// Print every position and the total invested value.
    List,
    /// Record a new position.
    Add {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        quantity: f64,
        #[arg(long)]
        entry_price: f64,
    },
    /// Delete a position by id.
    Remove {
        #[arg(long)]
        id: i64,
    },
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
///
/// This allows passing Windows paths in quotes without breaking parsing.
pub fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_watch_flags() {
        let args = Args::parse_from([
            "market_desk",
            "watch",
            "--symbol",
            "gbpusd",
            "--interval-ms",
            "250",
            "--ticks",
            "10",
            "--json",
        ]);
        let DeskCommand::Watch(watch) = args.command else {
            panic!("expected watch");
        };
        let config = watch.feed_args().normalize().unwrap();

        assert_eq!(config.symbol, "GBPUSD");
        assert_eq!(config.tick_interval.as_millis(), 250);
        assert_eq!(watch.ticks, Some(10));
        assert!(watch.json);
    }

    #[test]
    fn parses_portfolio_add() {
        let args = Args::parse_from([
            "market_desk",
            "portfolio",
            "--file",
            "p.json",
            "add",
            "--symbol",
            "EURUSD",
            "--quantity",
            "1000",
            "--entry-price",
            "1.08",
        ]);
        match args.command {
            DeskCommand::Portfolio {
                file,
                action: PortfolioAction::Add { quantity, .. },
            } => {
                assert_eq!(file, "p.json");
                assert_eq!(quantity, 1000.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn strips_quotes_from_paths() {
        assert_eq!(normalize_path(" \"pairs.txt\" "), PathBuf::from("pairs.txt"));
    }
}
