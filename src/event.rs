//! Inbound GitHub webhook deliveries and their classification.
//!
//! A delivery is a header map plus a raw body. The `X-GitHub-Event` header
//! selects which payload type the body is decoded into.

use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{NotifyError, Result};

/// Lowercase spelling of the discriminator header.
pub const EVENT_HEADER: &str = "x-github-event";
/// Title-cased spelling of the discriminator header.
pub const EVENT_HEADER_CAP: &str = "X-GitHub-Event";

/// GitHub event types that are valid but never produce a notification.
const UNWATCHED_EVENT_TYPES: &[&str] = &[
    "branch_protection_rule",
    "check_run",
    "check_suite",
    "code_scanning_alert",
    "content_reference",
    "deploy_key",
    "deployment",
    "deployment_status",
    "discussion",
    "discussion_comment",
    "fork",
    "github_app_authorization",
    "gollum",
    "installation",
    "installation_repositories",
    "label",
    "marketplace_purchase",
    "member",
    "membership",
    "meta",
    "milestone",
    "org_block",
    "organization",
    "package",
    "page_build",
    "ping",
    "project",
    "project_card",
    "project_column",
    "public",
    "release",
    "repository",
    "repository_dispatch",
    "repository_vulnerability_alert",
    "secret_scanning_alert",
    "security_advisory",
    "sponsorship",
    "star",
    "status",
    "team",
    "team_add",
    "user",
    "watch",
    "workflow_dispatch",
    "workflow_job",
    "workflow_run",
];

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(deserialize_with = "null_as_default")]
    pub login: String,
}

impl User {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Repository {
    #[serde(deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub html_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Label {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Milestone {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Comment {
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(deserialize_with = "null_as_default")]
    pub html_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub commit_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Issue {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(deserialize_with = "null_as_default")]
    pub html_url: String,
    pub milestone: Option<Milestone>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PullRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(deserialize_with = "null_as_default")]
    pub html_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Review {
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(deserialize_with = "null_as_default")]
    pub html_url: String,
}

/// Previous value of an edited attribute.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChangeFrom {
    #[serde(deserialize_with = "null_as_default")]
    pub from: String,
}

/// Attributes GitHub reports as changed by an `edited` action.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Changes {
    pub title: Option<ChangeFrom>,
    pub body: Option<ChangeFrom>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Commit {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
}

impl Commit {
    /// First seven characters of the commit id.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(7) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CommitCommentEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(deserialize_with = "null_as_default")]
    pub comment: Comment,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: User,
}

/// Payload shared by `create` and `delete`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RefEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub r#ref: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ref_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: User,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IssueCommentEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    pub changes: Option<Changes>,
    #[serde(deserialize_with = "null_as_default")]
    pub comment: Comment,
    #[serde(deserialize_with = "null_as_default")]
    pub issue: Issue,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: User,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IssuesEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    pub changes: Option<Changes>,
    #[serde(deserialize_with = "null_as_default")]
    pub issue: Issue,
    pub assignee: Option<User>,
    pub label: Option<Label>,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: User,
}

/// Payload shared by `pull_request` and `pull_request_target`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PullRequestEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    pub changes: Option<Changes>,
    #[serde(deserialize_with = "null_as_default")]
    pub pull_request: PullRequest,
    pub assignee: Option<User>,
    pub requested_reviewer: Option<User>,
    pub label: Option<Label>,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: User,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PullRequestReviewEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(deserialize_with = "null_as_default")]
    pub review: Review,
    #[serde(deserialize_with = "null_as_default")]
    pub pull_request: PullRequest,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: User,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PullRequestReviewCommentEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    pub changes: Option<Changes>,
    #[serde(deserialize_with = "null_as_default")]
    pub comment: Comment,
    #[serde(deserialize_with = "null_as_default")]
    pub pull_request: PullRequest,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: User,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PushEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub r#ref: String,
    #[serde(deserialize_with = "null_as_default")]
    pub commits: Vec<Commit>,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: User,
}

/// The ten event types that produce a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CommitComment,
    Create,
    Delete,
    IssueComment,
    Issues,
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
    PullRequestTarget,
    Push,
}

impl EventKind {
    pub const ALL: [EventKind; 10] = [
        EventKind::CommitComment,
        EventKind::Create,
        EventKind::Delete,
        EventKind::IssueComment,
        EventKind::Issues,
        EventKind::PullRequest,
        EventKind::PullRequestReview,
        EventKind::PullRequestReviewComment,
        EventKind::PullRequestTarget,
        EventKind::Push,
    ];

    pub fn from_discriminator(value: &str) -> Option<Self> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.discriminator() == value)
    }

    /// Value of the `X-GitHub-Event` header for this kind.
    pub fn discriminator(self) -> &'static str {
        match self {
            EventKind::CommitComment => "commit_comment",
            EventKind::Create => "create",
            EventKind::Delete => "delete",
            EventKind::IssueComment => "issue_comment",
            EventKind::Issues => "issues",
            EventKind::PullRequest => "pull_request",
            EventKind::PullRequestReview => "pull_request_review",
            EventKind::PullRequestReviewComment => "pull_request_review_comment",
            EventKind::PullRequestTarget => "pull_request_target",
            EventKind::Push => "push",
        }
    }

    /// Name used when an action has no dedicated wording.
    pub fn type_name(self) -> &'static str {
        match self {
            EventKind::CommitComment => "CommitCommentEvent",
            EventKind::Create => "CreateEvent",
            EventKind::Delete => "DeleteEvent",
            EventKind::IssueComment => "IssueCommentEvent",
            EventKind::Issues => "IssuesEvent",
            EventKind::PullRequest => "PullRequestEvent",
            EventKind::PullRequestReview => "PullRequestReviewEvent",
            EventKind::PullRequestReviewComment => "PullRequestReviewCommentEvent",
            EventKind::PullRequestTarget => "PullRequestTargetEvent",
            EventKind::Push => "PushEvent",
        }
    }
}

/// A classified webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    CommitComment(CommitCommentEvent),
    Create(RefEvent),
    Delete(RefEvent),
    IssueComment(IssueCommentEvent),
    Issues(IssuesEvent),
    PullRequest(PullRequestEvent),
    PullRequestReview(PullRequestReviewEvent),
    PullRequestReviewComment(PullRequestReviewCommentEvent),
    PullRequestTarget(PullRequestEvent),
    Push(PushEvent),
    /// A valid GitHub event type nobody asked to be notified about.
    Unwatched { event_type: String },
}

impl InboundEvent {
    /// `None` for unwatched events.
    pub fn kind(&self) -> Option<EventKind> {
        Some(match self {
            InboundEvent::CommitComment(_) => EventKind::CommitComment,
            InboundEvent::Create(_) => EventKind::Create,
            InboundEvent::Delete(_) => EventKind::Delete,
            InboundEvent::IssueComment(_) => EventKind::IssueComment,
            InboundEvent::Issues(_) => EventKind::Issues,
            InboundEvent::PullRequest(_) => EventKind::PullRequest,
            InboundEvent::PullRequestReview(_) => EventKind::PullRequestReview,
            InboundEvent::PullRequestReviewComment(_) => EventKind::PullRequestReviewComment,
            InboundEvent::PullRequestTarget(_) => EventKind::PullRequestTarget,
            InboundEvent::Push(_) => EventKind::Push,
            InboundEvent::Unwatched { .. } => return None,
        })
    }

    pub fn event_type(&self) -> &str {
        match self {
            InboundEvent::Unwatched { event_type } => event_type.as_str(),
            // kind() is only None for Unwatched
            other => other.kind().map(EventKind::discriminator).unwrap_or_default(),
        }
    }

    pub fn sender_login(&self) -> Option<&str> {
        let sender = match self {
            InboundEvent::CommitComment(e) => &e.sender,
            InboundEvent::Create(e) | InboundEvent::Delete(e) => &e.sender,
            InboundEvent::IssueComment(e) => &e.sender,
            InboundEvent::Issues(e) => &e.sender,
            InboundEvent::PullRequest(e) | InboundEvent::PullRequestTarget(e) => &e.sender,
            InboundEvent::PullRequestReview(e) => &e.sender,
            InboundEvent::PullRequestReviewComment(e) => &e.sender,
            InboundEvent::Push(e) => &e.sender,
            InboundEvent::Unwatched { .. } => return None,
        };
        Some(&sender.login)
    }

    /// Canned event used to smoke-test delivery without a live trigger.
    pub fn canned(repository_url: &str) -> Self {
        InboundEvent::Push(PushEvent {
            r#ref: "refs/heads/debug".to_string(),
            commits: Vec::new(),
            repository: Repository {
                full_name: String::new(),
                html_url: repository_url.to_string(),
            },
            sender: User::new("bot"),
        })
    }
}

/// Raw webhook delivery: headers plus an optional body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundRequest {
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl InboundRequest {
    pub fn new(headers: HashMap<String, String>, body: Option<Vec<u8>>) -> Self {
        Self { headers, body }
    }

    /// Build from an HTTP delivery. Header values that are not visible ASCII are dropped.
    pub fn from_http(headers: &HeaderMap, body: &[u8]) -> Self {
        let mut map = HashMap::with_capacity(headers.len());
        for (name, value) in headers {
            match value.to_str() {
                Ok(v) => {
                    map.insert(name.as_str().to_string(), v.to_string());
                }
                Err(_) => debug!("Skipping non-ASCII header {}", name),
            }
        }
        let body = if body.is_empty() {
            None
        } else {
            Some(body.to_vec())
        };
        Self { headers: map, body }
    }

    /// Build from a function-style envelope: `{"headers": {..}, "body": ".."}`.
    pub fn from_envelope(envelope: &Value) -> Result<Self> {
        let object = envelope
            .as_object()
            .ok_or_else(|| NotifyError::InvalidShape("invalid payload".to_string()))?;

        let mut headers = HashMap::new();
        match object.get("headers") {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => {
                for (name, value) in map {
                    let value = value
                        .as_str()
                        .ok_or_else(|| NotifyError::InvalidShape("invalid headers".to_string()))?;
                    headers.insert(name.clone(), value.to_string());
                }
            }
            Some(_) => return Err(NotifyError::InvalidShape("invalid headers".to_string())),
        }

        let body = match object.get("body") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone().into_bytes()),
            Some(_) => return Err(NotifyError::InvalidShape("invalid body".to_string())),
        };

        Ok(Self { headers, body })
    }

    /// Discriminator under exactly the two accepted header spellings.
    pub fn event_type(&self) -> Option<&str> {
        self.headers
            .get(EVENT_HEADER)
            .or_else(|| self.headers.get(EVENT_HEADER_CAP))
            .map(String::as_str)
    }
}

fn decode<T: DeserializeOwned>(event_type: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|source| NotifyError::MalformedBody {
        event_type: event_type.to_string(),
        source,
    })
}

/// Turn a raw delivery into a typed event.
pub fn classify(request: &InboundRequest) -> Result<InboundEvent> {
    let event_type = request
        .event_type()
        .ok_or(NotifyError::MissingHeader(EVENT_HEADER))?;
    let body = match request.body.as_deref() {
        Some(b) if !b.is_empty() => b,
        _ => return Err(NotifyError::MissingBody),
    };

    let Some(kind) = EventKind::from_discriminator(event_type) else {
        if UNWATCHED_EVENT_TYPES.contains(&event_type) {
            decode::<serde_json::Map<String, Value>>(event_type, body)?;
            return Ok(InboundEvent::Unwatched {
                event_type: event_type.to_string(),
            });
        }
        return Err(NotifyError::UnknownEventType(event_type.to_string()));
    };

    let event = match kind {
        EventKind::CommitComment => InboundEvent::CommitComment(decode(event_type, body)?),
        EventKind::Create => InboundEvent::Create(decode(event_type, body)?),
        EventKind::Delete => InboundEvent::Delete(decode(event_type, body)?),
        EventKind::IssueComment => InboundEvent::IssueComment(decode(event_type, body)?),
        EventKind::Issues => InboundEvent::Issues(decode(event_type, body)?),
        EventKind::PullRequest => InboundEvent::PullRequest(decode(event_type, body)?),
        EventKind::PullRequestReview => InboundEvent::PullRequestReview(decode(event_type, body)?),
        EventKind::PullRequestReviewComment => {
            InboundEvent::PullRequestReviewComment(decode(event_type, body)?)
        }
        EventKind::PullRequestTarget => InboundEvent::PullRequestTarget(decode(event_type, body)?),
        EventKind::Push => InboundEvent::Push(decode(event_type, body)?),
    };
    debug!("Classified {} event", event_type);
    Ok(event)
}
