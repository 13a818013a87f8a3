//! Exchange trading-session lookup.
//!
//! A static table of venues with their local session hours and standard UTC
//! offsets. Daylight-saving shifts are not modelled: each venue uses the offset
//! of its standard time all year. A venue is open on local weekdays within
//! `[open, close)`.

use chrono::{DateTime, Datelike, TimeDelta, Timelike, Utc};
use serde::Serialize;
use strum_macros::{Display, EnumString};

const SECONDS_PER_DAY: i64 = 86_400;

/// What happens next at a venue.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NextEventKind {
    Open,
    Close,
}

/// Next session boundary and how far away it is.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextEvent {
    pub kind: NextEventKind,
    pub time_until: TimeDelta,
}

/// Session state of one venue at a given instant.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeStatus {
    pub is_open: bool,
    pub next_event: NextEvent,
}

/// Static description of a trading venue.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub id: u8,
    pub name: &'static str,
    pub country: &'static str,
    /// Local opening time, minutes after midnight.
    pub open_minute: u32,
    /// Local closing time, minutes after midnight.
    pub close_minute: u32,
    /// Standard-time offset from UTC, in minutes.
    pub utc_offset_minutes: i32,
    pub timezone: &'static str,
}

impl Exchange {
    /// Opening time formatted as `HH:MM`.
    pub fn open_time(&self) -> String {
        format_minute(self.open_minute)
    }

    /// Closing time formatted as `HH:MM`.
    pub fn close_time(&self) -> String {
        format_minute(self.close_minute)
    }

    /// Computes whether the venue is open at `now` and when the next boundary occurs.
    pub fn status(&self, now: DateTime<Utc>) -> ExchangeStatus {
        let local = now.naive_utc() + TimeDelta::minutes(i64::from(self.utc_offset_minutes));
        let second_of_day = i64::from(local.num_seconds_from_midnight());
        let weekday = local.weekday().num_days_from_monday();
        let open = i64::from(self.open_minute) * 60;
        let close = i64::from(self.close_minute) * 60;

        let is_open = is_trading_day(weekday) && (open..close).contains(&second_of_day);
        if is_open {
            return ExchangeStatus {
                is_open,
                next_event: NextEvent {
                    kind: NextEventKind::Close,
                    time_until: TimeDelta::seconds(close - second_of_day),
                },
            };
        }

        let days_ahead = (0..=7)
            .find(|&days| {
                is_trading_day((weekday + days) % 7) && (days > 0 || second_of_day < open)
            })
            .unwrap_or(1);

        ExchangeStatus {
            is_open,
            next_event: NextEvent {
                kind: NextEventKind::Open,
                time_until: TimeDelta::seconds(
                    i64::from(days_ahead) * SECONDS_PER_DAY + open - second_of_day,
                ),
            },
        }
    }
}

fn is_trading_day(days_from_monday: u32) -> bool {
    days_from_monday < 5
}

fn format_minute(minute: u32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// Renders a countdown as `"8h 30m"`.
pub fn format_duration(duration: TimeDelta) -> String {
    let minutes = duration.num_minutes().max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// The venues shown on the exchanges screen.
pub fn exchanges() -> Vec<Exchange> {
    vec![
        Exchange {
            id: 1,
            name: "NYSE",
            country: "United States",
            open_minute: 9 * 60 + 30,
            close_minute: 16 * 60,
            utc_offset_minutes: -5 * 60,
            timezone: "EST/EDT (UTC-5/-4)",
        },
        Exchange {
            id: 2,
            name: "NASDAQ",
            country: "United States",
            open_minute: 9 * 60 + 30,
            close_minute: 16 * 60,
            utc_offset_minutes: -5 * 60,
            timezone: "EST/EDT (UTC-5/-4)",
        },
        Exchange {
            id: 3,
            name: "LSE",
            country: "United Kingdom",
            open_minute: 8 * 60,
            close_minute: 16 * 60 + 30,
            utc_offset_minutes: 0,
            timezone: "GMT/BST (UTC+0/+1)",
        },
        Exchange {
            id: 4,
            name: "Euronext",
            country: "Europe",
            open_minute: 9 * 60,
            close_minute: 17 * 60 + 30,
            utc_offset_minutes: 60,
            timezone: "CET/CEST (UTC+1/+2)",
        },
        Exchange {
            id: 5,
            name: "Tokyo Stock Exchange (TSE)",
            country: "Japan",
            open_minute: 9 * 60,
            close_minute: 15 * 60,
            utc_offset_minutes: 9 * 60,
            timezone: "JST (UTC+9)",
        },
        Exchange {
            id: 6,
            name: "Hong Kong Stock Exchange (HKEX)",
            country: "Hong Kong",
            open_minute: 9 * 60 + 30,
            close_minute: 16 * 60,
            utc_offset_minutes: 8 * 60,
            timezone: "HKT (UTC+8)",
        },
        Exchange {
            id: 7,
            name: "B3",
            country: "Brazil",
            open_minute: 10 * 60,
            close_minute: 17 * 60 + 55,
            utc_offset_minutes: -3 * 60,
            timezone: "BRT (UTC-3)",
        },
        Exchange {
            id: 8,
            name: "ASX",
            country: "Australia",
            open_minute: 10 * 60,
            close_minute: 16 * 60,
            utc_offset_minutes: 10 * 60,
            timezone: "AEST/AEDT (UTC+10/+11)",
        },
    ]
}
