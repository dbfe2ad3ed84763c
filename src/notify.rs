use async_trait::async_trait;

use crate::error::NotifyError;
use crate::model::participant::ParticipantId;
use crate::model::request::RequestId;

/// Affordances attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Controls {
    /// Main menu with the "new request" and help entries.
    MainMenu,
    /// One-shot yes/no keyboard for the confirmation step.
    Confirm,
    /// Approve/deny buttons bound to one request.
    Decision(RequestId),
}

/// A message already delivered, addressable for edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat: ParticipantId,
    pub message_id: i64,
}

/// Outbound side of the chat transport.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn send_message(
        &self,
        to: ParticipantId,
        text: &str,
        controls: Option<Controls>,
    ) -> Result<(), NotifyError>;

    /// Replaces the text of a delivered message and drops its buttons.
    async fn edit_message(&self, message: MessageRef, text: &str) -> Result<(), NotifyError>;
}
