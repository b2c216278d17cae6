mod common;

use common::{CountingTransport, UnreachableTransport, github_headers, push_body};
use gh_slack_notify::attachment::{COLOR, ERROR_COLOR};
use gh_slack_notify::{DeliveryOutcome, InboundRequest, Notifier, NotifyError};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;

fn request(event: &str, body: serde_json::Value) -> InboundRequest {
    InboundRequest::new(github_headers(event), Some(body.to_string().into_bytes()))
}

#[tokio::test]
async fn push_is_delivered_once() {
    let notifier = Notifier::new(CountingTransport::answering(200));
    let outcome = notifier.handle(&request("push", push_body())).await.unwrap();
    assert!(matches!(outcome, DeliveryOutcome::Delivered(_)));

    let sent = notifier.delivery().transport().sent();
    assert_eq!(sent.len(), 1);
    let attachment = &sent[0]["attachments"][0];
    assert_eq!(attachment["color"], COLOR);
    assert_eq!(
        attachment["fields"],
        json!([
            {"title": "account", "value": "Codertocat", "short": true},
            {"title": "action", "value": "pushed", "short": true},
            {"title": "target", "value": "refs/tags/simple-tag", "short": false},
            {"title": "Commit", "value": "<U|0123456> Small Changes\n", "short": false},
            {"title": "link", "value": "R", "short": false}
        ])
    );
}

#[tokio::test]
async fn unwatched_event_makes_no_delivery() {
    let notifier = Notifier::new(CountingTransport::answering(200));
    let outcome = notifier
        .handle(&request("star", json!({"action": "created"})))
        .await
        .unwrap();
    assert_eq!(outcome, DeliveryOutcome::Skipped);
    assert!(notifier.delivery().transport().sent().is_empty());
}

#[tokio::test]
async fn unknown_event_type_never_builds_a_message() {
    let notifier = Notifier::new(CountingTransport::answering(200));
    let req = request("xxxxx", json!({}));

    let err = notifier.build_message(&req).unwrap_err();
    assert!(matches!(err, NotifyError::UnknownEventType(ref t) if t == "xxxxx"));
    assert!(notifier.delivery().transport().sent().is_empty());

    // The full pipeline sends only the error report
    let err = notifier.handle(&req).await.unwrap_err();
    assert!(matches!(err, NotifyError::UnknownEventType(_)));
    let sent = notifier.delivery().transport().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["attachments"][0]["color"], ERROR_COLOR);
    assert_eq!(
        sent[0]["attachments"][0]["fields"][0]["value"],
        "unknown X-Github-Event in message: xxxxx"
    );
}

#[tokio::test]
async fn missing_header_names_the_key_and_skips_primary_delivery() {
    let notifier = Notifier::new(CountingTransport::answering(200));
    let req = InboundRequest::new(HashMap::new(), Some(push_body().to_string().into_bytes()));
    let err = notifier.build_message(&req).unwrap_err();
    assert!(err.to_string().contains("x-github-event"));
    assert!(notifier.delivery().transport().sent().is_empty());
}

#[tokio::test]
async fn failing_endpoint_gets_exactly_two_attempts() {
    let notifier = Notifier::new(CountingTransport::answering(500));
    let err = notifier.handle(&request("push", push_body())).await.unwrap_err();
    assert!(matches!(err, NotifyError::DeliveryFailed { status: 500, .. }));

    let sent = notifier.delivery().transport().sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["attachments"][0]["color"], COLOR);
    assert_eq!(sent[1]["attachments"][0]["color"], ERROR_COLOR);
}

#[tokio::test]
async fn unreachable_endpoint_returns_original_error() {
    let notifier = Notifier::new(UnreachableTransport {
        attempts: Mutex::new(0),
    });
    let err = notifier
        .send_and_report(Some(br#"{"attachments":[]}"#))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "webhook request failed: connection refused");
    assert_eq!(*notifier.delivery().transport().attempts.lock().unwrap(), 2);
}

#[tokio::test]
async fn nothing_to_send_is_not_reported() {
    let notifier = Notifier::new(UnreachableTransport {
        attempts: Mutex::new(0),
    });
    let outcome = notifier.send_and_report(None).await.unwrap();
    assert_eq!(outcome, DeliveryOutcome::Skipped);
    assert_eq!(*notifier.delivery().transport().attempts.lock().unwrap(), 0);
}

#[tokio::test]
async fn building_twice_is_byte_identical() {
    let notifier = Notifier::new(CountingTransport::answering(200));
    let req = request(
        "pull_request",
        json!({
            "action": "opened",
            "pull_request": {"title": "Update the README", "body": "", "html_url": "P"},
            "sender": {"login": "Codertocat"}
        }),
    );
    let first = notifier.build_message(&req).unwrap().unwrap();
    let second = notifier.build_message(&req).unwrap().unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn envelope_with_bad_headers_is_reported() {
    let notifier = Notifier::new(CountingTransport::answering(200));
    let err = notifier
        .handle_envelope(&json!({"headers": "push", "body": "{}"}))
        .await
        .unwrap_err();
    assert!(matches!(err, NotifyError::InvalidShape(_)));
    let sent = notifier.delivery().transport().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["attachments"][0]["fields"][0]["value"], "invalid headers");
}

#[tokio::test]
async fn single_shot_sends_the_canned_event() {
    let notifier = Notifier::new(CountingTransport::answering(200));
    notifier.run_single_shot().await.unwrap();
    let sent = notifier.delivery().transport().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["attachments"][0]["fields"][0]["value"], "bot");
}
