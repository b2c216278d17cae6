//! One-shot failure reporting through the delivery channel.

use tracing::{error, info, warn};

use crate::attachment::build_error_payload;
use crate::delivery::{DeliveryManager, DeliveryOutcome, WebhookTransport};
use crate::error::NotifyError;

/// Post one error attachment describing `failure`.
///
/// The outcome is only logged. This never calls back into itself, so a
/// failing webhook costs exactly one extra request.
pub async fn report_error<T: WebhookTransport>(manager: &DeliveryManager<T>, failure: &NotifyError) {
    error!("Pipeline failed: {}", failure);

    let message = match build_error_payload(failure) {
        Ok(m) => m,
        Err(e) => {
            warn!("Could not build error report: {}", e);
            return;
        }
    };

    match manager.deliver(Some(&message)).await {
        Ok(DeliveryOutcome::Delivered(_)) => info!("Error report delivered"),
        Ok(DeliveryOutcome::Skipped) => {}
        Err(e) => warn!("Error report was not delivered: {}", e),
    }
}

/// Deliver `message` and report a failure, returning the original result.
pub async fn send_and_report<T: WebhookTransport>(
    manager: &DeliveryManager<T>,
    message: Option<&[u8]>,
) -> crate::Result<DeliveryOutcome> {
    match manager.deliver(message).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            report_error(manager, &e).await;
            Err(e)
        }
    }
}
