//! Chat message entity.

use crate::domain::value_object::{ConnectionId, DisplayName, MessageText, Timestamp};

/// Author of a chat message: a room member or the relay itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageAuthor {
    /// Synthesized by the relay for join/leave/mic-change notices
    System,
    /// Sent by a room member
    Member(DisplayName),
}

impl MessageAuthor {
    /// Wire-level author name ("System" for relay-synthesized messages)
    pub fn as_str(&self) -> &str {
        match self {
            MessageAuthor::System => "System",
            MessageAuthor::Member(name) => name.as_str(),
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, MessageAuthor::System)
    }
}

/// One entry of a room's ordered message log.
///
/// System messages are interleaved in the same log as user messages, so
/// late joiners see join/leave/mic notices in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub author: MessageAuthor,
    pub text: MessageText,
    pub timestamp: Timestamp,
    /// Originating connection, set for member messages only
    pub origin: Option<ConnectionId>,
}

impl ChatMessage {
    /// Create a message authored by a room member
    pub fn member(
        name: DisplayName,
        text: MessageText,
        timestamp: Timestamp,
        origin: ConnectionId,
    ) -> Self {
        Self {
            author: MessageAuthor::Member(name),
            text,
            timestamp,
            origin: Some(origin),
        }
    }

    /// Create a relay-synthesized system message
    pub fn system(text: MessageText, timestamp: Timestamp) -> Self {
        Self {
            author: MessageAuthor::System,
            text,
            timestamp,
            origin: None,
        }
    }
}
