use chrono::{DateTime, NaiveDate};
use core_types::Bar;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

// --- Tradier response envelopes ---

/// `GET /markets/timesales` body. `series` is null on empty sessions.
#[derive(Deserialize, Debug)]
pub struct TimesalesResponse {
    pub series: Option<TimesalesSeries>,
}

#[derive(Deserialize, Debug)]
pub struct TimesalesSeries {
    #[serde(default)]
    pub data: Vec<TimesalePoint>,
}

#[derive(Deserialize, Debug)]
pub struct TimesalePoint {
    /// Unix seconds of the interval start.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl TimesalePoint {
    pub fn to_bar(&self) -> Bar {
        Bar {
            timestamp: DateTime::from_timestamp(self.timestamp, 0).unwrap_or_default(),
            open: Decimal::from_f64(self.open).unwrap_or_default(),
            high: Decimal::from_f64(self.high).unwrap_or_default(),
            low: Decimal::from_f64(self.low).unwrap_or_default(),
            close: Decimal::from_f64(self.close).unwrap_or_default(),
            volume: Decimal::from_f64(self.volume).unwrap_or_default(),
        }
    }
}

/// `GET /markets/history` body.
#[derive(Deserialize, Debug)]
pub struct HistoryResponse {
    pub history: Option<History>,
}

#[derive(Deserialize, Debug)]
pub struct History {
    #[serde(default)]
    pub day: Vec<DayBar>,
}

#[derive(Deserialize, Debug)]
pub struct DayBar {
    /// Session date, `YYYY-MM-DD`.
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl DayBar {
    pub fn to_bar(&self) -> Option<Bar> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?;
        let timestamp = date.and_hms_opt(0, 0, 0)?.and_utc();
        Some(Bar {
            timestamp,
            open: Decimal::from_f64(self.open).unwrap_or_default(),
            high: Decimal::from_f64(self.high).unwrap_or_default(),
            low: Decimal::from_f64(self.low).unwrap_or_default(),
            close: Decimal::from_f64(self.close).unwrap_or_default(),
            volume: Decimal::from_f64(self.volume).unwrap_or_default(),
        })
    }
}

/// `GET /markets/clock` body.
#[derive(Deserialize, Debug)]
pub struct ClockResponse {
    pub clock: Clock,
}

#[derive(Deserialize, Debug)]
pub struct Clock {
    /// "open", "closed", "premarket" or "postmarket".
    pub state: String,
}
