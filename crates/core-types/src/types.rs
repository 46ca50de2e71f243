use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A trading symbol, e.g. "SPY".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single OHLCV bar for one timeframe.
///
/// Bar sequences are supplied by the data-acquisition layer sorted oldest
/// first with strictly increasing timestamps. Consumers rely on that
/// ordering and do not re-validate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// The closed set of signal kinds the detector can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Oversold,
    Overbought,
    BullishDivergence,
    BearishDivergence,
}

impl SignalType {
    /// Divergence signals are unique chart events; they are exempt from the
    /// alert cooldown and de-duplicated by minute instead.
    pub fn is_divergence(&self) -> bool {
        matches!(
            self,
            SignalType::BullishDivergence | SignalType::BearishDivergence
        )
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalType::Oversold => "oversold",
            SignalType::Overbought => "overbought",
            SignalType::BullishDivergence => "bullish_divergence",
            SignalType::BearishDivergence => "bearish_divergence",
        };
        write!(f, "{name}")
    }
}

/// A detected RSI signal, ready to be handed to the alerting layer.
///
/// `timeframes_status` maps every monitored timeframe to its RSI value at
/// detection time (`None` when there was not enough history).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub signal_type: SignalType,
    pub timestamp: DateTime<Utc>,
    pub symbol: Symbol,
    pub timeframe: String,
    pub rsi_value: f64,
    pub confirmed: bool,
    pub timeframes_status: HashMap<String, Option<f64>>,
}

/// Parses an intraday timeframe identifier like "1min" or "30min" into its
/// bar length in minutes.
pub fn timeframe_minutes(timeframe: &str) -> crate::Result<u32> {
    timeframe
        .strip_suffix("min")
        .and_then(|n| n.parse::<u32>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| crate::Error::InvalidTimeframe(timeframe.to_string()))
}
