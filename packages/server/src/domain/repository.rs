//! Room store trait definition.
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::entity::{ChatMessage, Member, RoomSnapshot, SlotAssignment};
use super::error::RoomError;
use super::value_object::{ConnectionId, DisplayName, RoomId, SlotNumber, Timestamp};

/// Result of a successful leave operation
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    /// The removed member record
    pub member: Member,
    /// Mic slot released as part of the leave, if the member held one
    pub freed_slot: Option<u8>,
    /// Remaining members after the leave (empty when the room was deleted)
    pub remaining: Vec<Member>,
    /// True when this leave removed the last member and the room with it
    pub room_deleted: bool,
}

/// Overview of one room, for the room list endpoint
#[derive(Debug, Clone)]
pub struct RoomOverview {
    pub id: RoomId,
    pub user_count: usize,
    pub active_mics: usize,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Detail view of one room, for the room detail endpoint
#[derive(Debug, Clone)]
pub struct RoomDetail {
    pub id: RoomId,
    pub members: Vec<Member>,
    pub mic_slots: BTreeMap<u8, DisplayName>,
    pub message_count: usize,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Room store: the authoritative owner of all room state.
///
/// Room lifecycle is internal: `join` creates the room lazily on first
/// member, `leave` deletes it with the last member. Mutations to a single
/// room are serialized by the implementation; independent rooms never
/// block each other. No caller mutates room internals directly.
///
/// ## 依存性の逆転（DIP）
///
/// - ドメイン層が必要とするインターフェースをドメイン層自身が定義
/// - Infrastructure 層がドメイン層のインターフェースに依存
/// - ドメイン層は Infrastructure 層に依存しない
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Add a member, creating the room if absent. Returns the join-time
    /// snapshot for the new member (sent to that connection only).
    async fn join(&self, room_id: RoomId, member: Member) -> Result<RoomSnapshot, RoomError>;

    /// Remove the member for `connection_id`, releasing any mic slot held
    /// under its display name; deletes the room when it becomes empty.
    async fn leave(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Result<LeaveOutcome, RoomError>;

    /// Append to the room's ordered message log
    async fn append_message(&self, room_id: &RoomId, message: ChatMessage)
    -> Result<(), RoomError>;

    /// Assign `name` to a mic slot (atomic vacate-then-occupy)
    async fn assign_slot(
        &self,
        room_id: &RoomId,
        slot: SlotNumber,
        name: &DisplayName,
    ) -> Result<SlotAssignment, RoomError>;

    /// Release the slot held by `name`, optionally scoped to `slot`
    async fn release_slot(
        &self,
        room_id: &RoomId,
        slot: Option<SlotNumber>,
        name: &DisplayName,
    ) -> Result<Option<u8>, RoomError>;

    /// Slot currently held by `name`, if any
    async fn slot_of(&self, room_id: &RoomId, name: &DisplayName)
    -> Result<Option<u8>, RoomError>;

    /// Current membership, insertion order
    async fn list_members(&self, room_id: &RoomId) -> Result<Vec<Member>, RoomError>;

    /// Full slot -> holder map of the room
    async fn mic_slots(
        &self,
        room_id: &RoomId,
    ) -> Result<BTreeMap<u8, DisplayName>, RoomError>;

    /// Overviews of all live rooms
    async fn list_rooms(&self) -> Vec<RoomOverview>;

    /// Detail view of one room
    async fn room_detail(&self, room_id: &RoomId) -> Result<RoomDetail, RoomError>;

    /// Number of live rooms
    async fn room_count(&self) -> usize;
}
