//! Validation errors raised at the ingestion boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngagementError {
    #[error("invalid event_type '{kind}' (valid types: {})", .allowed.join(", "))]
    InvalidEventKind {
        kind: String,
        allowed: Vec<&'static str>,
    },

    #[error("malformed event: missing required field '{field}'")]
    MalformedEvent { field: &'static str },

    #[error("unknown signal type '{kind}' (valid types: {})", .allowed.join(", "))]
    UnknownSignalType {
        kind: String,
        allowed: Vec<&'static str>,
    },

    #[error("invalid metadata: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngagementError {
    /// The offending field name for malformed events, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            EngagementError::MalformedEvent { field } => Some(*field),
            EngagementError::InvalidEventKind { .. } => Some("event_type"),
            _ => None,
        }
    }
}
