use serde::Deserialize;

/// Alert delivery configuration, deserialized from the `[alerts]` block.
#[derive(Deserialize, Debug, Clone)]
pub struct AlertSettings {
    /// Minimum seconds between two oversold/overbought alerts of the same
    /// kind. Divergence alerts are exempt.
    #[serde(default = "default_cooldown")]
    pub cooldown_seconds: u64,

    #[serde(default = "default_history_file")]
    pub history_file: String,

    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Discord webhook delivery; absent means disabled.
    #[serde(default)]
    pub discord: Option<DiscordSettings>,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_cooldown(),
            history_file: default_history_file(),
            max_history: default_max_history(),
            discord: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct DiscordSettings {
    pub webhook_url: String,
}

fn default_cooldown() -> u64 {
    300
}
fn default_history_file() -> String {
    "alerts_history.json".to_string()
}
fn default_max_history() -> usize {
    1000
}
