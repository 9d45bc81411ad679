//! Room entity: membership, message log and mic slots of one named room.

use std::collections::{BTreeMap, VecDeque};

use crate::domain::entity::message::ChatMessage;
use crate::domain::entity::mic::{MicSlotBoard, SlotAssignment};
use crate::domain::error::RoomError;
use crate::domain::value_object::{
    ConnectionId, DisplayName, IdentityId, RoomId, SlotNumber, Timestamp,
};

/// Retained message log size per room (drop-oldest ring)
const MESSAGE_LOG_CAPACITY: usize = 500;

/// Number of recent messages included in a join snapshot
pub const SNAPSHOT_MESSAGE_COUNT: usize = 50;

/// One member of a room, keyed by connection id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub name: DisplayName,
    pub identity: IdentityId,
    pub joined_at: Timestamp,
}

impl Member {
    pub fn new(
        connection_id: ConnectionId,
        name: DisplayName,
        identity: IdentityId,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            connection_id,
            name,
            identity,
            joined_at,
        }
    }
}

/// One-time state dump delivered to a connection at join time only
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub your_name: DisplayName,
    pub members: Vec<Member>,
    pub mic_slots: BTreeMap<u8, DisplayName>,
    pub messages: Vec<ChatMessage>,
}

/// A named, ephemeral group chat + mic session.
///
/// A room exists in the store if and only if it has at least one member;
/// all state (messages, slots) is discarded when the last member leaves.
/// Mutations go through these methods so the membership and mic slot
/// invariants hold at all times.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    members: Vec<Member>,
    messages: VecDeque<ChatMessage>,
    mic: MicSlotBoard,
}

impl Room {
    pub fn new(id: RoomId, created_at: Timestamp, slot_count: u8) -> Self {
        Self {
            id,
            created_at,
            updated_at: created_at,
            members: Vec::new(),
            messages: VecDeque::new(),
            mic: MicSlotBoard::new(slot_count),
        }
    }

    /// Add a member record. Exactly one record per connection id.
    pub fn add_member(&mut self, member: Member) -> Result<(), RoomError> {
        if self
            .members
            .iter()
            .any(|m| m.connection_id == member.connection_id)
        {
            return Err(RoomError::AlreadyMember(
                member.connection_id.as_str().to_string(),
            ));
        }
        self.updated_at = member.joined_at;
        self.members.push(member);
        Ok(())
    }

    /// Remove the member record for `connection_id`, along with any mic
    /// slot held under that member's display name.
    ///
    /// Returns the removed member and the freed slot, or `None` if the
    /// connection was not a member (idempotent).
    pub fn remove_member(
        &mut self,
        connection_id: &ConnectionId,
        now: Timestamp,
    ) -> Option<(Member, Option<u8>)> {
        let index = self
            .members
            .iter()
            .position(|m| &m.connection_id == connection_id)?;
        let member = self.members.remove(index);
        // release() with a valid name and no slot scope cannot fail
        let freed = self.mic.release(None, &member.name).unwrap_or(None);
        self.updated_at = now;
        Some((member, freed))
    }

    pub fn member(&self, connection_id: &ConnectionId) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| &m.connection_id == connection_id)
    }

    /// Current members in insertion (join) order
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Append to the ordered message log, dropping the oldest entry when
    /// the retained capacity is reached.
    pub fn push_message(&mut self, message: ChatMessage) {
        if self.messages.len() == MESSAGE_LOG_CAPACITY {
            self.messages.pop_front();
        }
        self.updated_at = message.timestamp;
        self.messages.push_back(message);
    }

    /// The most recent `count` messages, oldest first
    pub fn recent_messages(&self, count: usize) -> Vec<ChatMessage> {
        let skip = self.messages.len().saturating_sub(count);
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn assign_slot(
        &mut self,
        slot: SlotNumber,
        name: &DisplayName,
        now: Timestamp,
    ) -> Result<SlotAssignment, RoomError> {
        let assignment = self.mic.assign(slot, name)?;
        self.updated_at = now;
        Ok(assignment)
    }

    pub fn release_slot(
        &mut self,
        slot: Option<SlotNumber>,
        name: &DisplayName,
        now: Timestamp,
    ) -> Result<Option<u8>, RoomError> {
        let freed = self.mic.release(slot, name)?;
        if freed.is_some() {
            self.updated_at = now;
        }
        Ok(freed)
    }

    pub fn slot_of(&self, name: &DisplayName) -> Option<u8> {
        self.mic.slot_of(name)
    }

    /// Full slot -> holder map, ordered by slot number
    pub fn mic_slots(&self) -> BTreeMap<u8, DisplayName> {
        self.mic.occupancy()
    }

    pub fn active_mic_count(&self) -> usize {
        self.mic.active_count()
    }

    /// Build the join-time snapshot for `your_name`
    pub fn snapshot_for(&self, your_name: DisplayName) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id.clone(),
            your_name,
            members: self.members.clone(),
            mic_slots: self.mic.occupancy(),
            messages: self.recent_messages(SNAPSHOT_MESSAGE_COUNT),
        }
    }
}
