//! In-memory connection registry implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionId, ConnectionRegistry, RegistryError, RoomBinding, RoomId,
};

/// インメモリ ConnectionRegistry 実装
///
/// 接続中の connection とそのルーム所属を保持します。
pub struct InMemoryConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, Connection>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self, connection_id: ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.insert(connection_id.clone(), Connection::new(connection_id.clone()));
        tracing::debug!("Connection '{}' registered", connection_id);
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let mut connections = self.connections.lock().await;
        let connection = connections.remove(connection_id)?;
        tracing::debug!("Connection '{}' unregistered", connection_id);
        connection.binding.map(|b| b.room_id)
    }

    async fn get(&self, connection_id: &ConnectionId) -> Option<Connection> {
        let connections = self.connections.lock().await;
        connections.get(connection_id).cloned()
    }

    async fn bind_room(
        &self,
        connection_id: &ConnectionId,
        binding: RoomBinding,
    ) -> Result<(), RegistryError> {
        let mut connections = self.connections.lock().await;
        let connection = connections.get_mut(connection_id).ok_or_else(|| {
            RegistryError::ConnectionNotFound(connection_id.as_str().to_string())
        })?;
        connection.binding = Some(binding);
        Ok(())
    }

    async fn clear_binding(&self, connection_id: &ConnectionId) -> Option<RoomBinding> {
        let mut connections = self.connections.lock().await;
        connections
            .get_mut(connection_id)
            .and_then(|connection| connection.binding.take())
    }
}
