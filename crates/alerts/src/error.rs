use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("alert history I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("alert history serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("webhook request failed: {0}")]
    Webhook(#[from] reqwest::Error),

    #[error("webhook returned status {0}")]
    WebhookStatus(u16),
}

pub type Result<T> = std::result::Result<T, Error>;
