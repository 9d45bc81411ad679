//! WebSocket event DTOs.
//!
//! Events use internally-tagged JSON enums (`{"type": "join_room", ...}`),
//! one variant per event name. Required and optional fields are explicit
//! and validated at the boundary before reaching core logic. WebRTC
//! payloads stay opaque (`serde_json::Value`); the relay never inspects
//! them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Serde helper for `BTreeMap<u8, String>` fields inside internally-tagged
/// enum variants.
///
/// JSON object keys are always strings, so these maps serialize as
/// `{"1": "alice"}` either way. The default `Deserialize` for a `u8`-keyed
/// map relies on serde_json coercing the string key back to an integer, but
/// that coercion is lost when an internally-tagged enum buffers the variant
/// content (keys surface as strings, yielding `invalid type: string "1",
/// expected u8`). This module restores the coercion explicitly while keeping
/// the on-the-wire bytes identical.
mod u8_keyed_map {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(map: &BTreeMap<u8, String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        map.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<u8, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string_keyed = BTreeMap::<String, String>::deserialize(deserializer)?;
        string_keyed
            .into_iter()
            .map(|(key, value)| {
                key.parse::<u8>()
                    .map(|key| (key, value))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

/// Events sent from a client connection to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Join a room, optionally authenticating with an identity token.
    JoinRoom {
        room_id: String,
        user_name: String,
        #[serde(default)]
        identity_token: Option<String>,
    },

    /// Send a chat message to the joined room.
    SendMessage { room_id: String, text: String },

    /// Occupy a mic slot.
    JoinMic { room_id: String, slot: u8 },

    /// Release a mic slot; with `slot` omitted, releases whichever slot
    /// the sender's name holds.
    LeaveMic {
        room_id: String,
        #[serde(default)]
        slot: Option<u8>,
    },

    /// Leave the joined room explicitly.
    LeaveRoom { room_id: String },

    /// Ask which slot a user holds.
    GetUserSlot { room_id: String, user_name: String },

    /// Relay a WebRTC offer to a specific peer connection.
    WebrtcOffer {
        target: String,
        payload: serde_json::Value,
    },

    /// Relay a WebRTC answer to a specific peer connection.
    WebrtcAnswer {
        target: String,
        payload: serde_json::Value,
    },

    /// Relay an ICE candidate to a specific peer connection.
    WebrtcIce {
        target: String,
        payload: serde_json::Value,
    },

    /// Application-level keepalive.
    Ping,
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// Member entry as seen on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub name: String,
    pub joined_at: String,
}

/// Chat log entry as seen on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub user: String,
    pub text: String,
    pub timestamp: String,
    pub is_system: bool,
}

/// Events sent from the relay to client connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Greeting on transport connect, carrying the session's connection id.
    Connected { connection_id: String },

    /// One-time state dump, unicast to the joiner only.
    RoomSnapshot {
        room_id: String,
        your_name: String,
        members: Vec<MemberInfo>,
        #[serde(with = "u8_keyed_map")]
        mic_slots: BTreeMap<u8, String>,
        messages: Vec<MessageInfo>,
    },

    /// Chat message (user or system), broadcast to the room.
    NewMessage {
        user: String,
        text: String,
        timestamp: String,
        is_system: bool,
    },

    /// Full slot -> name map, broadcast after every slot change.
    MicUpdate {
        #[serde(with = "u8_keyed_map")]
        slots: BTreeMap<u8, String>,
    },

    /// A user occupied a slot.
    UserJoinedMic { slot: u8, user_name: String },

    /// A user vacated a slot.
    UserLeftMic { slot: u8, user_name: String },

    /// Mic operation rejected, unicast to the offender.
    MicError { code: String, message: String },

    /// Current member list, broadcast on membership changes.
    MemberUpdate { members: Vec<MemberInfo> },

    /// Answer to `get_user_slot`, unicast to the asker.
    UserSlotInfo { user_name: String, slot: u8 },

    /// Non-mic error, unicast to the offender.
    Error { code: String, message: String },

    /// Keepalive answer.
    Pong { timestamp: String },

    /// Relayed WebRTC offer.
    WebrtcOffer {
        from: String,
        payload: serde_json::Value,
    },

    /// Relayed WebRTC answer.
    WebrtcAnswer {
        from: String,
        payload: serde_json::Value,
    },

    /// Relayed ICE candidate.
    WebrtcIce {
        from: String,
        payload: serde_json::Value,
    },
}
