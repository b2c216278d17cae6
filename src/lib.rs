//! GitHub webhook notifications delivered to a Slack incoming webhook.

pub mod api;
pub mod attachment;
pub mod config;
pub mod delivery;
pub mod error;
pub mod event;
pub mod fields;
pub mod logging;
pub mod pipeline;
pub mod report;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

pub use config::{NotifierConfig, Provider, RunMode};
pub use delivery::{DeliveryOutcome, DeliveryResult, SlackWebhookClient, WebhookTransport};
pub use error::{NotifyError, Result};
pub use event::{InboundEvent, InboundRequest};
pub use pipeline::Notifier;

/// Read-only state shared by every request.
pub struct AppState {
    pub config: NotifierConfig,
    pub notifier: Notifier<SlackWebhookClient>,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: NotifierConfig) -> Result<Self> {
        let notifier = Notifier::from_config(&config)?;
        Ok(Self {
            config,
            notifier,
            start_time: Instant::now(),
            started_at: Utc::now(),
        })
    }
}

pub type SharedState = Arc<AppState>;
