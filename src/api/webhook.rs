//! Webhook handlers: raw GitHub deliveries and function-style envelopes.

use axum::{
    Json,
    body::Bytes,
    extract::State as AxumState,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::warn;

use crate::SharedState;
use crate::delivery::DeliveryOutcome;
use crate::error::{NotifyError, Result};
use crate::event::InboundRequest;

/// HTTP status reported back to the caller for a failed invocation.
pub fn status_for(error: &NotifyError) -> StatusCode {
    if error.is_classification() {
        StatusCode::BAD_REQUEST
    } else if error.is_delivery() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn respond(result: Result<DeliveryOutcome>) -> Response {
    match result {
        Ok(DeliveryOutcome::Delivered(_)) => {
            (StatusCode::OK, Json(json!({"status": "delivered"}))).into_response()
        }
        Ok(DeliveryOutcome::Skipped) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            let status = status_for(&e);
            warn!("Invocation failed with {}: {}", status, e);
            (
                status,
                Json(json!({"status": "error", "message": e.to_string()})),
            )
                .into_response()
        }
    }
}

/// Handles a GitHub webhook POST request.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = InboundRequest::from_http(&headers, &body);
    respond(state.notifier.handle(&request).await)
}

/// Handles `{"headers": {..}, "body": ".."}` envelopes forwarded by a function gateway.
pub async fn handle_invoke(AxumState(state): AxumState<SharedState>, body: Bytes) -> Response {
    // Undecodable JSON is treated like any other non-object envelope
    let envelope: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    respond(state.notifier.handle_envelope(&envelope).await)
}
