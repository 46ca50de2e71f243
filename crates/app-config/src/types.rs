use alerts::AlertSettings;
use serde::Deserialize;
use signals::RsiSettings;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,

    /// The symbol whose bars are polled and analyzed.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Which market-data provider backs the polling loop.
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub rsi: RsiSettings,

    /// Timeframes monitored in parallel, e.g. ["1min", "5min", "30min"].
    #[serde(default = "default_timeframes")]
    pub timeframes: Vec<String>,

    #[serde(default)]
    pub tradier: TradierSettings,

    #[serde(default)]
    pub alerts: AlertSettings,

    pub server: ServerSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Tradier,
    /// Simulated random-walk data, no credentials required.
    Mock,
}

#[derive(Deserialize, Debug, Clone)]
pub struct EngineSettings {
    #[serde(default = "default_polling_interval")]
    pub polling_interval_seconds: u64,
    /// How many historical bars to request per timeframe each cycle.
    #[serde(default = "default_bars_count")]
    pub historical_bars_count: usize,
    /// Poll even when the market clock says closed (for testing).
    #[serde(default)]
    pub bypass_market_hours: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            polling_interval_seconds: default_polling_interval(),
            historical_bars_count: default_bars_count(),
            bypass_market_hours: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TradierSettings {
    #[serde(default)]
    pub api_key: String,
    /// Sandbox by default; point at production explicitly.
    #[serde(default = "default_tradier_base_url")]
    pub base_url: String,
}

impl Default for TradierSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_tradier_base_url(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

fn default_symbol() -> String {
    "SPY".to_string()
}

fn default_timeframes() -> Vec<String> {
    vec![
        "1min".to_string(),
        "5min".to_string(),
        "30min".to_string(),
    ]
}

fn default_polling_interval() -> u64 {
    20
}

fn default_bars_count() -> usize {
    2000
}

fn default_tradier_base_url() -> String {
    "https://sandbox.tradier.com/v1".to_string()
}
