//! Event formatting utilities for client display.

use hiroba_server::infrastructure::dto::websocket::{MemberInfo, MessageInfo, ServerEvent};

/// Event formatter for client display
pub struct EventFormatter;

impl EventFormatter {
    /// Format one server event for the terminal.
    ///
    /// Returns `None` for events the CLI does not display (WebRTC relays).
    pub fn format(event: &ServerEvent, current_name: &str) -> Option<String> {
        match event {
            ServerEvent::Connected { connection_id } => {
                Some(format!("\n* connected (session {connection_id})\n"))
            }
            ServerEvent::RoomSnapshot {
                room_id,
                members,
                mic_slots,
                messages,
                ..
            } => Some(Self::format_snapshot(
                room_id,
                members,
                mic_slots,
                messages,
                current_name,
            )),
            ServerEvent::NewMessage {
                user,
                text,
                timestamp,
                is_system,
            } => {
                if *is_system {
                    Some(format!("\n* {text} ({timestamp})\n"))
                } else {
                    Some(format!("\n[{timestamp}] {user}: {text}\n"))
                }
            }
            ServerEvent::MicUpdate { slots } => {
                let mut output = String::from("\nMic slots:\n");
                if slots.is_empty() {
                    output.push_str("(all free)\n");
                } else {
                    for (slot, name) in slots {
                        output.push_str(&format!("  {slot}: {name}\n"));
                    }
                }
                Some(output)
            }
            ServerEvent::UserJoinedMic { slot, user_name } => {
                Some(format!("\n+ {user_name} is on mic {slot}\n"))
            }
            ServerEvent::UserLeftMic { slot, user_name } => {
                Some(format!("\n- {user_name} left mic {slot}\n"))
            }
            ServerEvent::MicError { message, .. } => Some(format!("\n! mic error: {message}\n")),
            ServerEvent::MemberUpdate { members } => {
                let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
                Some(format!("\nMembers: {}\n", names.join(", ")))
            }
            ServerEvent::UserSlotInfo { user_name, slot } => {
                Some(format!("\n{user_name} holds mic slot {slot}\n"))
            }
            ServerEvent::Error { code, message } => {
                Some(format!("\n! error [{code}]: {message}\n"))
            }
            ServerEvent::Pong { timestamp } => Some(format!("\npong at {timestamp}\n")),
            // WebRTC negotiation payloads are not rendered by the CLI
            ServerEvent::WebrtcOffer { .. }
            | ServerEvent::WebrtcAnswer { .. }
            | ServerEvent::WebrtcIce { .. } => None,
        }
    }

    fn format_snapshot(
        room_id: &str,
        members: &[MemberInfo],
        mic_slots: &std::collections::BTreeMap<u8, String>,
        messages: &[MessageInfo],
        current_name: &str,
    ) -> String {
        let mut output = String::new();
        output.push_str("\n\n============================================================\n");
        output.push_str(&format!("Room: {room_id}\n"));

        output.push_str("Members:\n");
        if members.is_empty() {
            output.push_str("(no members)\n");
        } else {
            for member in members {
                let me_suffix = if member.name == current_name { " (me)" } else { "" };
                output.push_str(&format!(
                    "  {}{} - joined at {}\n",
                    member.name, me_suffix, member.joined_at
                ));
            }
        }

        if !mic_slots.is_empty() {
            output.push_str("Mic slots:\n");
            for (slot, name) in mic_slots {
                output.push_str(&format!("  {slot}: {name}\n"));
            }
        }

        if !messages.is_empty() {
            output.push_str("Recent messages:\n");
            for message in messages {
                if message.is_system {
                    output.push_str(&format!("  * {}\n", message.text));
                } else {
                    output.push_str(&format!("  {}: {}\n", message.user, message.text));
                }
            }
        }

        output.push_str("============================================================\n");
        output
    }

    /// Format a raw (unparseable) frame
    pub fn format_raw(text: &str) -> String {
        format!("\n? {text}\n")
    }
}
