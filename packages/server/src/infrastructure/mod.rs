//! Infrastructure layer: concrete implementations of the domain ports
//! and the DTOs spoken on the wire.

pub mod dto;
pub mod gateway;
pub mod message_pusher;
pub mod registry;
pub mod repository;

pub use gateway::HmacMediaGateway;
pub use message_pusher::WebSocketMessagePusher;
pub use registry::InMemoryConnectionRegistry;
pub use repository::InMemoryRoomStore;
