//! Error types for the usecase layer.

use thiserror::Error;

use crate::domain::{RegistryError, RoomError};

/// Errors raised when joining a room
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRoomError {
    /// The identity token was declined by the external gateway
    #[error("identity verification failed")]
    AuthenticationFailed,

    /// The connection is already a member of a room
    #[error("connection is already in a room")]
    AlreadyInRoom,

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
