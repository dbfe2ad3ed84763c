use thiserror::Error;

use crate::model::participant::ParticipantId;
use crate::model::request::{RequestId, RequestStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request {0} not found")]
    NotFound(RequestId),

    #[error("request {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: RequestId,
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("request store unavailable at {path}: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why an approver action was refused. None of these mutate the store.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("participant {0} is not the approver")]
    Unauthorized(ParticipantId),

    #[error("request {0} not found")]
    NotFound(RequestId),

    #[error("request {id} was already {status}")]
    AlreadyDecided { id: RequestId, status: RequestStatus },

    #[error(transparent)]
    StoreUnavailable(StoreError),
}

impl From<StoreError> for DecisionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => DecisionError::NotFound(id),
            StoreError::InvalidTransition { id, from, .. } => {
                DecisionError::AlreadyDecided { id, status: from }
            }
            other @ StoreError::Unavailable { .. } => DecisionError::StoreUnavailable(other),
        }
    }
}

/// Button payload that could not be decoded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackDataError {
    #[error("missing action separator")]
    MissingSeparator,

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("empty request id")]
    EmptyId,

    #[error("escape character at end of payload")]
    DanglingEscape,

    #[error("unescaped separator inside request id")]
    UnescapedSeparator,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("transport request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat API refused the call ({code}): {description}")]
    Api { code: i64, description: String },

    #[error("no approver configured")]
    NotConfigured,
}
