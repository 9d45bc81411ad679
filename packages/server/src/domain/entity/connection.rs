//! Connection registry record and media credential entities.

use crate::domain::value_object::{ConnectionId, DisplayName, IdentityId, RoomId};

/// Room binding of a connection: set while the connection is a room member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomBinding {
    pub room_id: RoomId,
    pub name: DisplayName,
    pub identity: IdentityId,
}

/// One live transport-level session.
///
/// Created on transport connect, destroyed on transport disconnect. A
/// connection belongs to at most one room at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub binding: Option<RoomBinding>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> Self {
        Self { id, binding: None }
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.binding.as_ref().map(|b| &b.room_id)
    }
}

/// Media-session credential issued by the external gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCredential {
    pub app_id: String,
    pub user_id: String,
    pub signature: String,
    pub expires_in: u64,
}
