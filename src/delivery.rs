//! Outbound delivery to the Slack incoming webhook.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::{NotifyError, Result};

/// Raw outcome of one POST, before it is judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub status_code: u16,
    pub status_text: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// There was nothing to send; no request was made.
    Skipped,
    Delivered(DeliveryResult),
}

/// Sends one JSON body to the configured endpoint.
///
/// Implementations return `TransportFailed` when no HTTP response was
/// received and a `DeliveryResult` for any response, whatever its status.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post_json(&self, body: Vec<u8>) -> Result<DeliveryResult>;
}

/// reqwest-backed transport for a Slack incoming webhook URL.
#[derive(Debug, Clone)]
pub struct SlackWebhookClient {
    client: Client,
    webhook_url: String,
}

impl SlackWebhookClient {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("gh_slack_notify/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NotifyError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }
}

#[async_trait]
impl WebhookTransport for SlackWebhookClient {
    async fn post_json(&self, body: Vec<u8>) -> Result<DeliveryResult> {
        debug!("POST {} ({} bytes)", self.webhook_url, body.len());
        let response = self
            .client
            .post(&self.webhook_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::TransportFailed(format!("request timed out: {}", e))
                } else {
                    NotifyError::TransportFailed(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NotifyError::TransportFailed(format!("failed to read response: {}", e)))?;

        Ok(DeliveryResult {
            status_code: status.as_u16(),
            status_text: status.to_string(),
            body,
        })
    }
}

/// Judges transport results: only HTTP 200 counts as delivered.
#[derive(Debug, Clone)]
pub struct DeliveryManager<T> {
    transport: T,
}

impl<T: WebhookTransport> DeliveryManager<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `message`, or do nothing when there is no message.
    pub async fn deliver(&self, message: Option<&[u8]>) -> Result<DeliveryOutcome> {
        let message = match message {
            Some(m) if !m.is_empty() => m,
            _ => {
                debug!("Nothing to deliver");
                return Ok(DeliveryOutcome::Skipped);
            }
        };

        let result = match self.transport.post_json(message.to_vec()).await {
            Ok(result) => result,
            Err(e) => {
                error!("Webhook request failed: {}", e);
                return Err(e);
            }
        };

        info!(
            "Status: {}, StatusCode {}, Body: {}",
            result.status_text, result.status_code, result.body
        );

        if result.status_code != 200 {
            return Err(NotifyError::DeliveryFailed {
                status: result.status_code,
                status_text: result.status_text,
                body: result.body,
            });
        }
        Ok(DeliveryOutcome::Delivered(result))
    }
}
