//! Message pusher trait definition.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::MessagePushError;
use super::value_object::ConnectionId;

/// Channel used to push serialized events to one client connection
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Outbound message delivery to connected clients.
///
/// The WebSocket itself is created in the ui layer; this abstraction only
/// manages the per-connection senders and delivers serialized events to
/// one connection (`push_to`) or a target list (`broadcast`).
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register a client's sender channel
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// Remove a client's sender channel
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// Deliver to a single connection; fails if the connection is unknown
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// Deliver to every target; partial failure is tolerated (logged and
    /// skipped), since targets may disconnect mid-broadcast
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}
