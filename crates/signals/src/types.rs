use serde::Deserialize;

/// RSI detector configuration, deserialized from the `[rsi]` settings block.
#[derive(Deserialize, Debug, Clone)]
pub struct RsiSettings {
    #[serde(default = "default_period")]
    pub period: usize,
    #[serde(default = "default_oversold")]
    pub oversold_threshold: f64,
    #[serde(default = "default_overbought")]
    pub overbought_threshold: f64,
}

impl Default for RsiSettings {
    fn default() -> Self {
        Self {
            period: default_period(),
            oversold_threshold: default_oversold(),
            overbought_threshold: default_overbought(),
        }
    }
}

fn default_period() -> usize {
    14
}
fn default_oversold() -> f64 {
    30.0
}
fn default_overbought() -> f64 {
    70.0
}
