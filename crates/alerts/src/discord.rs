use crate::types::DiscordSettings;
use crate::{Error, Result};
use serde_json::json;
use std::time::Duration;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);
const WEBHOOK_USERNAME: &str = "RSI Alerter";

/// Posts formatted alert messages to a Discord webhook.
pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(settings: &DiscordSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(Error::Webhook)?;

        Ok(Self {
            client,
            webhook_url: settings.webhook_url.clone(),
        })
    }

    /// Sends one alert message as a fenced code block.
    pub async fn send(&self, message: &str) -> Result<()> {
        let payload = json!({
            "content": format!("```\n{message}\n```"),
            "username": WEBHOOK_USERNAME,
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(Error::Webhook)?;

        if !response.status().is_success() {
            return Err(Error::WebhookStatus(response.status().as_u16()));
        }

        Ok(())
    }
}
