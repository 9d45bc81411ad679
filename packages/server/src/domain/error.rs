//! Error types for the domain layer.

use thiserror::Error;

/// Validation errors raised when constructing value objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("slot number must be 1 or greater")]
    SlotOutOfRange,
}

/// Errors raised by room and mic slot operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("connection is not a member of the room")]
    NotAMember,

    #[error("connection '{0}' is already a member of the room")]
    AlreadyMember(String),

    #[error("mic slot {slot} is already taken by '{holder}'")]
    SlotTaken { slot: u8, holder: String },

    #[error("mic slot {slot} is outside the valid range 1..={max}")]
    InvalidSlot { slot: u8, max: u8 },
}

/// Errors raised by the connection registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(String),
}

/// Errors raised when pushing messages to clients
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// Errors raised by the external identity/credential gateway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("media credential issuer is not configured")]
    NotConfigured,

    #[error("failed to sign media credential: {0}")]
    SigningFailed(String),
}
