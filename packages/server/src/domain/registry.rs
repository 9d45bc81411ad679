//! Connection registry trait definition.

use async_trait::async_trait;

use super::entity::{Connection, RoomBinding};
use super::error::RegistryError;
use super::value_object::{ConnectionId, RoomId};

/// Registry of live transport connections.
///
/// Tracks which room and identity each connection belongs to. No two live
/// connections share an id; `unregister` reports which room (if any) the
/// connection was bound to, so the caller can drive room cleanup exactly
/// once.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Track a new transport connection
    async fn register(&self, connection_id: ConnectionId);

    /// Drop the connection record; returns the room it was bound to, if any
    async fn unregister(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// Look up a connection record
    async fn get(&self, connection_id: &ConnectionId) -> Option<Connection>;

    /// Bind the connection to a room (set on successful join)
    async fn bind_room(
        &self,
        connection_id: &ConnectionId,
        binding: RoomBinding,
    ) -> Result<(), RegistryError>;

    /// Clear the room binding (on leave); returns the previous binding
    async fn clear_binding(&self, connection_id: &ConnectionId) -> Option<RoomBinding>;
}
