//! UseCase layer: one usecase per inbound operation.
//!
//! Each usecase validates the sender against the connection registry,
//! mutates state through the room store, and returns the fan-out decision
//! (snapshot, broadcast targets, notices) to the ui layer. Taxonomy errors
//! never cross this boundary unhandled; the ui layer converts them to
//! unicast error events.

pub mod error;
pub mod forward_signal;
pub mod get_room_detail;
pub mod get_rooms;
pub mod get_user_slot;
pub mod issue_credential;
pub mod join_mic;
pub mod join_room;
pub mod leave_mic;
pub mod leave_room;
pub mod send_message;

pub use error::JoinRoomError;
pub use forward_signal::ForwardSignalUseCase;
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use get_user_slot::GetUserSlotUseCase;
pub use issue_credential::IssueMediaCredentialUseCase;
pub use join_mic::{JoinMicOutcome, JoinMicUseCase};
pub use join_room::{JoinRoomOutcome, JoinRoomUseCase};
pub use leave_mic::{LeaveMicOutcome, LeaveMicUseCase};
pub use leave_room::{LeaveRoomOutcome, LeaveRoomUseCase};
pub use send_message::{SendMessageOutcome, SendMessageUseCase};

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, RoomBinding, RoomError, RoomId};

/// Resolve the sender's room binding and check it against the room id the
/// event names. Any mismatch is reported as `NotAMember`: the sender has
/// no business in that room.
pub(crate) async fn resolve_member(
    registry: &Arc<dyn ConnectionRegistry>,
    connection_id: &ConnectionId,
    room_id: &RoomId,
) -> Result<RoomBinding, RoomError> {
    let connection = registry
        .get(connection_id)
        .await
        .ok_or(RoomError::NotAMember)?;
    let binding = connection.binding.ok_or(RoomError::NotAMember)?;
    if &binding.room_id != room_id {
        return Err(RoomError::NotAMember);
    }
    Ok(binding)
}
