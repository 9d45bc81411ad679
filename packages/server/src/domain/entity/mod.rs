//! Entities for the signaling relay domain.

pub mod connection;
pub mod message;
pub mod mic;
pub mod room;

pub use connection::{Connection, MediaCredential, RoomBinding};
pub use message::{ChatMessage, MessageAuthor};
pub use mic::{MicSlotBoard, SlotAssignment};
pub use room::{Member, Room, RoomSnapshot};
