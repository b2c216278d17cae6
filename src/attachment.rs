//! Slack attachment payloads.

use serde::Serialize;

use crate::error::{NotifyError, Result};

pub const COLOR: &str = "#2eb67d";
pub const ERROR_COLOR: &str = "#e01e5a";
pub const FALLBACK: &str = "GitHub Notification";
pub const TITLE: &str = "GitHub Notification";
pub const TITLE_LINK: &str = "https://github.com/SongCastle/ggnb";

/// Title of the single field carried by an error report.
pub const ERROR_FIELD: &str = "error";

/// One labelled unit inside an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl Field {
    pub fn new(title: impl Into<String>, value: impl Into<String>, short: bool) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short,
        }
    }
}

/// Selects the presentation constants of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Normal,
    Error,
}

impl Variant {
    fn color(self) -> &'static str {
        match self {
            Variant::Normal => COLOR,
            Variant::Error => ERROR_COLOR,
        }
    }
}

// Field order here is the order on the wire.
#[derive(Debug, Serialize)]
pub struct Attachment {
    pub color: &'static str,
    pub fallback: &'static str,
    pub fields: Vec<Field>,
    pub title_link: &'static str,
    pub title: &'static str,
}

impl Attachment {
    pub fn new(fields: Vec<Field>, variant: Variant) -> Self {
        Self {
            color: variant.color(),
            fallback: FALLBACK,
            fields,
            title_link: TITLE_LINK,
            title: TITLE,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = Payload {
            attachments: std::slice::from_ref(self),
        };
        serde_json::to_vec(&payload).map_err(NotifyError::SerializationFailed)
    }
}

#[derive(Serialize)]
struct Payload<'a> {
    attachments: &'a [Attachment],
}

/// Serialize `fields` into a webhook message.
pub fn build_payload(fields: Vec<Field>, variant: Variant) -> Result<Vec<u8>> {
    Attachment::new(fields, variant).to_bytes()
}

/// Message describing a pipeline failure.
pub fn build_error_payload(error: &NotifyError) -> Result<Vec<u8>> {
    build_payload(
        vec![Field::new(ERROR_FIELD, error.to_string(), false)],
        Variant::Error,
    )
}
