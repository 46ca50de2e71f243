// --- WebSocket message structures shared by the engine and the dashboard ---

use chrono::{DateTime, Utc};
use core_types::Signal;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// An admitted alert pushed to connected dashboard clients.
#[derive(Debug, Clone, Serialize)]
pub struct WsAlert {
    pub signal: Signal,
    pub message: String,
}

/// One polling cycle's market snapshot for charting.
#[derive(Debug, Clone, Serialize)]
pub struct WsMarketUpdate {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    /// Current RSI per timeframe; timeframes without enough history are
    /// simply absent.
    pub rsi_by_timeframe: HashMap<String, f64>,
}

/// The top-level WebSocket message enum.
/// `tag` and `content` are used by serde for clean JSON representation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum WsMessage {
    Alert(WsAlert),
    MarketUpdate(WsMarketUpdate),
}

/// Replay cache of recent messages, shared between the engine (producer)
/// and the WebSocket handler (replays it to newly connected clients).
pub type WsCache = std::sync::Arc<std::sync::Mutex<std::collections::VecDeque<WsMessage>>>;

/// The maximum number of messages to keep in the replay cache.
pub const WS_CACHE_SIZE: usize = 200;
