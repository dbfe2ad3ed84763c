use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Chat identity of a user; in private chats it doubles as the chat id
/// messages are delivered to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub i64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub first_name: String,
    pub display_name: String,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, first_name: &str, last_name: Option<&str>) -> Self {
        let display_name = match last_name {
            Some(last) if !last.trim().is_empty() => format!("{} {}", first_name, last),
            _ => first_name.to_string(),
        };

        Self {
            id: id.into(),
            first_name: first_name.to_string(),
            display_name,
        }
    }
}
