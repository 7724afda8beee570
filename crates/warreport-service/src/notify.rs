//! Notification publishing.
//!
//! Reports are published as a JSON `{"text": ...}` POST to a configured
//! webhook (the Slack incoming-webhook shape). Without a configured
//! endpoint the service runs dry: reports land in the operational log.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;

/// Errors that can occur while publishing a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Notification endpoint answered HTTP {status}")]
    Http { status: u16 },
}

/// Publishes battle report text somewhere an operator will see it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, text: &str) -> Result<(), NotifyError>;
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Production notifier: POSTs to a webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn publish(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(&self.url)
            .json(&WebhookPayload { text })
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(NotifyError::Http {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Dry-run notifier: writes the report to the log instead.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, text: &str) -> Result<(), NotifyError> {
        info!(report = %text, "Battle report (no webhook configured)");
        Ok(())
    }
}
