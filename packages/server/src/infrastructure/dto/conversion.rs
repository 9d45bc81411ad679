//! Conversion logic between DTOs and domain entities.

use hiroba_shared::time::millis_to_rfc3339;

use crate::domain::{ChatMessage, Member, RoomError, RoomSnapshot};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Member> for dto::MemberInfo {
    fn from(member: &Member) -> Self {
        Self {
            name: member.name.as_str().to_string(),
            joined_at: millis_to_rfc3339(member.joined_at.value()),
        }
    }
}

impl From<&ChatMessage> for dto::MessageInfo {
    fn from(message: &ChatMessage) -> Self {
        Self {
            user: message.author.as_str().to_string(),
            text: message.text.as_str().to_string(),
            timestamp: millis_to_rfc3339(message.timestamp.value()),
            is_system: message.author.is_system(),
        }
    }
}

impl From<&ChatMessage> for dto::ServerEvent {
    fn from(message: &ChatMessage) -> Self {
        let info = dto::MessageInfo::from(message);
        dto::ServerEvent::NewMessage {
            user: info.user,
            text: info.text,
            timestamp: info.timestamp,
            is_system: info.is_system,
        }
    }
}

impl From<RoomSnapshot> for dto::ServerEvent {
    fn from(snapshot: RoomSnapshot) -> Self {
        dto::ServerEvent::RoomSnapshot {
            room_id: snapshot.room_id.as_str().to_string(),
            your_name: snapshot.your_name.as_str().to_string(),
            members: snapshot.members.iter().map(dto::MemberInfo::from).collect(),
            mic_slots: snapshot
                .mic_slots
                .into_iter()
                .map(|(slot, name)| (slot, name.into_string()))
                .collect(),
            messages: snapshot.messages.iter().map(dto::MessageInfo::from).collect(),
        }
    }
}

// ========================================
// Error codes on the wire
// ========================================

/// Machine-checkable code for a room/mic error
pub fn room_error_code(error: &RoomError) -> &'static str {
    match error {
        RoomError::RoomNotFound(_) => "room_not_found",
        RoomError::NotAMember => "not_a_member",
        RoomError::AlreadyMember(_) => "already_in_room",
        RoomError::SlotTaken { .. } => "slot_taken",
        RoomError::InvalidSlot { .. } => "invalid_slot",
    }
}

/// Code reported when identity verification declines a join
pub const AUTHENTICATION_FAILED: &str = "authentication_failed";

/// Code reported for payloads that fail boundary validation
pub const INVALID_PAYLOAD: &str = "invalid_payload";
