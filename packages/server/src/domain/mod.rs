//! Domain layer for the signaling relay.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod gateway;
pub mod pusher;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use entity::{
    ChatMessage, Connection, MediaCredential, Member, MessageAuthor, MicSlotBoard, Room,
    RoomBinding, RoomSnapshot, SlotAssignment,
};
pub use error::{GatewayError, MessagePushError, RegistryError, RoomError, ValueObjectError};
pub use gateway::IdentityGateway;
pub use pusher::{MessagePusher, PusherChannel};
pub use registry::ConnectionRegistry;
pub use repository::{LeaveOutcome, RoomDetail, RoomOverview, RoomStore};
pub use value_object::{
    ConnectionId, DisplayName, IdentityId, MessageText, RoomId, SlotNumber, Timestamp,
};
