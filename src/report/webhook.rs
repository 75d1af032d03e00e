use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to build webhook client: {0}")]
    Client(reqwest::Error),

    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("webhook rejected the message with status {0}")]
    Status(u16),
}

/// Delivers a JSON payload to a webhook URL.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, url: &str, payload: &str) -> Result<(), NotifyError>;
}

/// WebEx incoming-webhook notifier
pub struct WebexNotifier {
    client: reqwest::Client,
}

impl WebexNotifier {
    pub fn new() -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(NotifyError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for WebexNotifier {
    async fn send(&self, url: &str, payload: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(payload.to_string())
            .send()
            .await?;

        let status = response.status();
        debug!("Webhook answered with {}", status);
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }
}
