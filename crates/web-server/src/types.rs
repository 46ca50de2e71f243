use serde::{Deserialize, Serialize};

/// Query parameters for the alert history endpoint.
#[derive(Deserialize, Debug)]
pub struct HistoryParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// Static process information served at `/api/status`.
#[derive(Serialize, Debug, Clone)]
pub struct StatusInfo {
    pub symbol: String,
    pub timeframes: Vec<String>,
    pub provider: String,
    pub polling_interval_seconds: u64,
}
