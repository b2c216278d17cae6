use std::io;

/// Every way a notification can fail, from startup to delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    InvalidShape(String),

    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("missing body")]
    MissingBody,

    #[error("unknown X-Github-Event in message: {0}")]
    UnknownEventType(String),

    #[error("failed to decode {event_type} payload: {source}")]
    MalformedBody {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Status: {status_text}, StatusCode {status}, Body: {body}")]
    DeliveryFailed {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("webhook request failed: {0}")]
    TransportFailed(String),

    #[error("failed to serialize payload: {0}")]
    SerializationFailed(#[source] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

impl NotifyError {
    /// True for failures raised while turning the inbound request into an event.
    pub fn is_classification(&self) -> bool {
        matches!(
            self,
            NotifyError::InvalidShape(_)
                | NotifyError::MissingHeader(_)
                | NotifyError::MissingBody
                | NotifyError::UnknownEventType(_)
                | NotifyError::MalformedBody { .. }
        )
    }

    /// True for failures of the outbound webhook call itself.
    pub fn is_delivery(&self) -> bool {
        matches!(
            self,
            NotifyError::DeliveryFailed { .. } | NotifyError::TransportFailed(_)
        )
    }
}

/// Helper type for Results that use NotifyError
pub type Result<T> = std::result::Result<T, NotifyError>;
