use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

use crate::error::StoreError;
use crate::model::participant::{Participant, ParticipantId};

/// Day format users type and read (GG/MM/AAAA).
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Opaque request token. Never contains anything but what
/// `utils::request_id` generates, but is treated as free text everywhere
/// it crosses a boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestKind {
    Leave,
    ShortAbsence,
}

impl RequestKind {
    /// Name shown to users ("ferie" / "permesso").
    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::Leave => "Ferie",
            RequestKind::ShortAbsence => "Permesso",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// Kind-specific payload. The `kind` tag is flattened into the request record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestDetails {
    Leave {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    ShortAbsence {
        date: NaiveDate,
        /// Hours or a short description ("dalle 9 alle 11", "2 ore al mattino").
        duration: String,
    },
}

impl RequestDetails {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestDetails::Leave { .. } => RequestKind::Leave,
            RequestDetails::ShortAbsence { .. } => RequestKind::ShortAbsence,
        }
    }
}

/// A finished conversation, not yet stored. The store assigns id, status and
/// timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    pub requester_id: ParticipantId,
    pub requester_name: String,
    pub details: RequestDetails,
    pub reason: Option<String>,
}

impl NewRequest {
    pub fn new(requester: &Participant, details: RequestDetails, reason: Option<String>) -> Self {
        Self {
            requester_id: requester.id,
            requester_name: requester.display_name.clone(),
            details,
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub requester_id: ParticipantId,
    pub requester_name: String,
    #[serde(flatten)]
    pub details: RequestDetails,
    pub reason: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

impl Request {
    pub fn from_new(id: RequestId, new: NewRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            requester_id: new.requester_id,
            requester_name: new.requester_name,
            details: new.details,
            reason: new.reason,
            status: RequestStatus::Pending,
            created_at,
            decided_at: None,
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.details.kind()
    }

    /// Moves a pending request into a terminal status. Anything else is
    /// rejected and leaves the record untouched.
    pub fn transition(&mut self, to: RequestStatus, at: DateTime<Utc>) -> Result<(), StoreError> {
        if self.status.is_terminal() || !to.is_terminal() {
            return Err(StoreError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to,
            });
        }

        self.status = to;
        self.decided_at = Some(at);
        Ok(())
    }
}
