//! Classify → extract → build, then deliver → report.

use serde_json::Value;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::attachment::{TITLE_LINK, Variant, build_payload};
use crate::config::NotifierConfig;
use crate::delivery::{DeliveryManager, DeliveryOutcome, SlackWebhookClient, WebhookTransport};
use crate::error::Result;
use crate::event::{InboundEvent, InboundRequest, classify};
use crate::fields::extract;
use crate::report::{report_error, send_and_report};

/// Turn an event into a webhook message. `None` means nothing to announce.
pub fn build_event_message(event: &InboundEvent) -> Result<Option<Vec<u8>>> {
    debug!(
        "Building {} message from {}",
        event.event_type(),
        event.sender_login().unwrap_or("-")
    );
    let fields = extract(event);
    if fields.is_empty() {
        debug!("No notification for {} event", event.event_type());
        return Ok(None);
    }
    build_payload(fields, Variant::Normal).map(Some)
}

/// Runs the notification pipeline against one delivery channel.
#[derive(Debug)]
pub struct Notifier<T> {
    delivery: DeliveryManager<T>,
}

impl Notifier<SlackWebhookClient> {
    pub fn from_config(config: &NotifierConfig) -> Result<Self> {
        let client = SlackWebhookClient::new(config.webhook_url.clone(), config.timeout)?;
        Ok(Self::new(client))
    }
}

impl<T: WebhookTransport> Notifier<T> {
    pub fn new(transport: T) -> Self {
        Self {
            delivery: DeliveryManager::new(transport),
        }
    }

    pub fn delivery(&self) -> &DeliveryManager<T> {
        &self.delivery
    }

    /// Classify `request` and build its message.
    pub fn build_message(&self, request: &InboundRequest) -> Result<Option<Vec<u8>>> {
        let event = classify(request)?;
        build_event_message(&event)
    }

    /// Deliver `message`; on failure post one error report and return the failure.
    pub async fn send_and_report(&self, message: Option<&[u8]>) -> Result<DeliveryOutcome> {
        send_and_report(&self.delivery, message).await
    }

    /// Full pipeline for one inbound delivery.
    pub async fn handle(&self, request: &InboundRequest) -> Result<DeliveryOutcome> {
        let invocation_id = Uuid::now_v7();
        let span = info_span!(
            "invocation",
            id = %invocation_id,
            event = request.event_type().unwrap_or("-")
        );
        async {
            let message = match self.build_message(request) {
                Ok(m) => m,
                Err(e) => {
                    report_error(&self.delivery, &e).await;
                    return Err(e);
                }
            };
            let outcome = self.send_and_report(message.as_deref()).await?;
            if outcome == DeliveryOutcome::Skipped {
                info!("Unwatched event, nothing delivered");
            }
            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    /// Full pipeline for a function-style envelope `{"headers": {..}, "body": ".."}`.
    pub async fn handle_envelope(&self, envelope: &Value) -> Result<DeliveryOutcome> {
        match InboundRequest::from_envelope(envelope) {
            Ok(request) => self.handle(&request).await,
            Err(e) => {
                report_error(&self.delivery, &e).await;
                Err(e)
            }
        }
    }

    /// Run the pipeline once on a canned event.
    pub async fn run_single_shot(&self) -> Result<DeliveryOutcome> {
        let span = info_span!("invocation", id = %Uuid::now_v7(), event = "single_shot");
        async {
            let event = InboundEvent::canned(TITLE_LINK);
            let message = match build_event_message(&event) {
                Ok(m) => m,
                Err(e) => {
                    report_error(&self.delivery, &e).await;
                    return Err(e);
                }
            };
            self.send_and_report(message.as_deref()).await
        }
        .instrument(span)
        .await
    }
}
