//! WebSocket connection handlers.
//!
//! One task pair per connection: a receive loop that parses inbound events
//! and dispatches them to the usecases, and a push loop that drains the
//! connection's outbound queue into the socket. Transport disconnect goes
//! through the same leave usecase as an explicit `leave_room` event.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use hiroba_shared::time::{millis_to_rfc3339, now_unix_millis};

use crate::{
    domain::{
        ConnectionId, DisplayName, MessageText, RoomError, RoomId, SlotAssignment, SlotNumber,
    },
    infrastructure::dto::{
        conversion::{AUTHENTICATION_FAILED, INVALID_PAYLOAD, room_error_code},
        websocket::{ClientEvent, MemberInfo, ServerEvent},
    },
    usecase::{JoinRoomError, LeaveRoomOutcome},
};

use super::super::state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them
/// to the WebSocket sender.
///
/// This function handles the outbound message flow: events addressed to
/// this connection (via rx channel) are sent to its WebSocket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            // Send the message to this client
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    state.registry.register(connection_id.clone()).await;
    state.pusher.register_client(connection_id.clone(), tx).await;

    let (mut sender, mut receiver) = socket.split();

    // Greet the connection with its session id
    let connected = ServerEvent::Connected {
        connection_id: connection_id.as_str().to_string(),
    };
    match encode(&connected) {
        Some(json) => {
            if let Err(e) = sender.send(Message::Text(json.into())).await {
                tracing::error!("Failed to greet connection '{}': {}", connection_id, e);
                state.pusher.unregister_client(&connection_id).await;
                state.registry.unregister(&connection_id).await;
                return;
            }
        }
        None => {
            state.pusher.unregister_client(&connection_id).await;
            state.registry.unregister(&connection_id).await;
            return;
        }
    }
    tracing::info!("Connection '{}' established", connection_id);

    let recv_state = state.clone();
    let recv_conn = connection_id.clone();

    // Receive loop: parse and dispatch inbound events
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", recv_conn, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch_event(&recv_state, &recv_conn, &text).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", recv_conn);
                    break;
                }
                _ => {}
            }
        }
    });

    // Push loop: drain the outbound queue into the socket
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Disconnect cleanup reuses the same leave path as an explicit leave
    if let Some(outcome) = state.leave_room_usecase.execute(&connection_id).await {
        broadcast_leave(&state, &outcome).await;
    }
    state.pusher.unregister_client(&connection_id).await;
    state.registry.unregister(&connection_id).await;
    tracing::info!("Connection '{}' closed and cleaned up", connection_id);
}

/// Serialize a server event, logging instead of panicking on failure
fn encode(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to encode server event: {}", e);
            None
        }
    }
}

async fn push(state: &AppState, target: &ConnectionId, event: &ServerEvent) {
    let Some(json) = encode(event) else { return };
    if let Err(e) = state.pusher.push_to(target, &json).await {
        tracing::warn!("Failed to push event to '{}': {}", target, e);
    }
}

async fn broadcast(state: &AppState, targets: &[ConnectionId], event: &ServerEvent) {
    let Some(json) = encode(event) else { return };
    if let Err(e) = state.pusher.broadcast(targets.to_vec(), &json).await {
        tracing::warn!("Failed to broadcast event: {}", e);
    }
}

async fn push_error(state: &AppState, target: &ConnectionId, code: &str, message: String) {
    push(
        state,
        target,
        &ServerEvent::Error {
            code: code.to_string(),
            message,
        },
    )
    .await;
}

async fn push_mic_error(state: &AppState, target: &ConnectionId, code: &str, message: String) {
    push(
        state,
        target,
        &ServerEvent::MicError {
            code: code.to_string(),
            message,
        },
    )
    .await;
}

fn member_infos(members: &[crate::domain::Member]) -> Vec<MemberInfo> {
    members.iter().map(MemberInfo::from).collect()
}

fn slot_map(
    slots: &std::collections::BTreeMap<u8, DisplayName>,
) -> std::collections::BTreeMap<u8, String> {
    slots
        .iter()
        .map(|(slot, name)| (*slot, name.as_str().to_string()))
        .collect()
}

/// Parse one inbound frame and route it to the matching usecase.
///
/// Unexpected internal faults are isolated to this event: every branch
/// reports failures to the sender and returns, never unwinding the
/// connection task.
async fn dispatch_event(state: &Arc<AppState>, connection_id: &ConnectionId, text: &str) {
    tracing::debug!("Received event from '{}': {}", connection_id, text);

    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Failed to parse event from '{}': {}", connection_id, e);
            push_error(
                state,
                connection_id,
                INVALID_PAYLOAD,
                format!("unrecognized event: {e}"),
            )
            .await;
            return;
        }
    };

    match event {
        ClientEvent::JoinRoom {
            room_id,
            user_name,
            identity_token,
        } => handle_join_room(state, connection_id, room_id, user_name, identity_token).await,
        ClientEvent::SendMessage { room_id, text } => {
            handle_send_message(state, connection_id, room_id, text).await
        }
        ClientEvent::JoinMic { room_id, slot } => {
            handle_join_mic(state, connection_id, room_id, slot).await
        }
        ClientEvent::LeaveMic { room_id, slot } => {
            handle_leave_mic(state, connection_id, room_id, slot).await
        }
        ClientEvent::LeaveRoom { room_id } => {
            handle_leave_room(state, connection_id, room_id).await
        }
        ClientEvent::GetUserSlot { room_id, user_name } => {
            handle_get_user_slot(state, connection_id, room_id, user_name).await
        }
        ClientEvent::WebrtcOffer { target, payload } => {
            let event = |from: String| ServerEvent::WebrtcOffer { from, payload };
            handle_forward(state, connection_id, target, event).await
        }
        ClientEvent::WebrtcAnswer { target, payload } => {
            let event = |from: String| ServerEvent::WebrtcAnswer { from, payload };
            handle_forward(state, connection_id, target, event).await
        }
        ClientEvent::WebrtcIce { target, payload } => {
            let event = |from: String| ServerEvent::WebrtcIce { from, payload };
            handle_forward(state, connection_id, target, event).await
        }
        ClientEvent::Ping => {
            push(
                state,
                connection_id,
                &ServerEvent::Pong {
                    timestamp: millis_to_rfc3339(now_unix_millis()),
                },
            )
            .await;
        }
    }
}

async fn handle_join_room(
    state: &AppState,
    connection_id: &ConnectionId,
    room_id: String,
    user_name: String,
    identity_token: Option<String>,
) {
    let (room_id, name) = match (RoomId::new(room_id), DisplayName::new(user_name)) {
        (Ok(room_id), Ok(name)) => (room_id, name),
        (Err(e), _) | (_, Err(e)) => {
            push_error(state, connection_id, INVALID_PAYLOAD, e.to_string()).await;
            return;
        }
    };

    match state
        .join_room_usecase
        .execute(connection_id.clone(), room_id, name, identity_token)
        .await
    {
        Ok(outcome) => {
            // Snapshot goes to the joiner only, never re-broadcast
            let members = member_infos(&outcome.snapshot.members);
            push(state, connection_id, &ServerEvent::from(outcome.snapshot)).await;

            // Everyone else learns about the join through the system line
            broadcast(
                state,
                &outcome.notify_targets,
                &ServerEvent::from(&outcome.joined_message),
            )
            .await;

            // The whole room (joiner included) gets the fresh member list
            broadcast(
                state,
                &outcome.all_targets,
                &ServerEvent::MemberUpdate { members },
            )
            .await;
        }
        Err(JoinRoomError::AuthenticationFailed) => {
            push_error(
                state,
                connection_id,
                AUTHENTICATION_FAILED,
                "identity verification failed".to_string(),
            )
            .await;
        }
        Err(JoinRoomError::AlreadyInRoom) => {
            push_error(
                state,
                connection_id,
                "already_in_room",
                "leave the current room before joining another".to_string(),
            )
            .await;
        }
        Err(JoinRoomError::Room(e)) => {
            push_error(state, connection_id, room_error_code(&e), e.to_string()).await;
        }
        Err(JoinRoomError::Registry(e)) => {
            push_error(state, connection_id, "internal_error", e.to_string()).await;
        }
    }
}

async fn handle_send_message(
    state: &AppState,
    connection_id: &ConnectionId,
    room_id: String,
    text: String,
) {
    let (room_id, text) = match (RoomId::new(room_id), MessageText::new(text)) {
        (Ok(room_id), Ok(text)) => (room_id, text),
        (Err(e), _) | (_, Err(e)) => {
            push_error(state, connection_id, INVALID_PAYLOAD, e.to_string()).await;
            return;
        }
    };

    match state
        .send_message_usecase
        .execute(connection_id, &room_id, text)
        .await
    {
        Ok(outcome) => {
            broadcast(state, &outcome.targets, &ServerEvent::from(&outcome.message)).await;
        }
        Err(e) => {
            push_error(state, connection_id, room_error_code(&e), e.to_string()).await;
        }
    }
}

async fn handle_join_mic(
    state: &AppState,
    connection_id: &ConnectionId,
    room_id: String,
    slot: u8,
) {
    let (room_id, slot) = match (RoomId::new(room_id), SlotNumber::new(slot)) {
        (Ok(room_id), Ok(slot)) => (room_id, slot),
        (Err(e), _) | (_, Err(e)) => {
            push_mic_error(state, connection_id, "invalid_slot", e.to_string()).await;
            return;
        }
    };

    match state
        .join_mic_usecase
        .execute(connection_id, &room_id, slot)
        .await
    {
        Ok(outcome) => {
            let name = outcome.name.as_str().to_string();
            match outcome.assignment {
                // Re-assigning the held slot: nothing changed, nothing to say
                SlotAssignment::AlreadyHeld { .. } => return,
                SlotAssignment::Moved { from, to } => {
                    // The vacated slot is announced before the new one
                    broadcast(
                        state,
                        &outcome.targets,
                        &ServerEvent::UserLeftMic {
                            slot: from,
                            user_name: name.clone(),
                        },
                    )
                    .await;
                    broadcast(
                        state,
                        &outcome.targets,
                        &ServerEvent::MicUpdate {
                            slots: slot_map(&outcome.slots),
                        },
                    )
                    .await;
                    broadcast(
                        state,
                        &outcome.targets,
                        &ServerEvent::UserJoinedMic {
                            slot: to,
                            user_name: name,
                        },
                    )
                    .await;
                }
                SlotAssignment::Joined { slot } => {
                    broadcast(
                        state,
                        &outcome.targets,
                        &ServerEvent::MicUpdate {
                            slots: slot_map(&outcome.slots),
                        },
                    )
                    .await;
                    broadcast(
                        state,
                        &outcome.targets,
                        &ServerEvent::UserJoinedMic {
                            slot,
                            user_name: name,
                        },
                    )
                    .await;
                }
            }
            if let Some(notice) = &outcome.notice_message {
                broadcast(state, &outcome.targets, &ServerEvent::from(notice)).await;
            }
        }
        Err(e) => {
            // Conflicts go to the sender only; the slot map is untouched
            push_mic_error(state, connection_id, room_error_code(&e), e.to_string()).await;
        }
    }
}

async fn handle_leave_mic(
    state: &AppState,
    connection_id: &ConnectionId,
    room_id: String,
    slot: Option<u8>,
) {
    let room_id = match RoomId::new(room_id) {
        Ok(room_id) => room_id,
        Err(e) => {
            push_mic_error(state, connection_id, INVALID_PAYLOAD, e.to_string()).await;
            return;
        }
    };
    let slot = match slot.map(SlotNumber::new).transpose() {
        Ok(slot) => slot,
        Err(e) => {
            push_mic_error(state, connection_id, "invalid_slot", e.to_string()).await;
            return;
        }
    };

    match state
        .leave_mic_usecase
        .execute(connection_id, &room_id, slot)
        .await
    {
        Ok(outcome) => {
            // Only broadcast when something was actually freed
            let Some(freed) = outcome.freed_slot else { return };
            broadcast(
                state,
                &outcome.targets,
                &ServerEvent::UserLeftMic {
                    slot: freed,
                    user_name: outcome.name.as_str().to_string(),
                },
            )
            .await;
            broadcast(
                state,
                &outcome.targets,
                &ServerEvent::MicUpdate {
                    slots: slot_map(&outcome.slots),
                },
            )
            .await;
            if let Some(notice) = &outcome.notice_message {
                broadcast(state, &outcome.targets, &ServerEvent::from(notice)).await;
            }
        }
        Err(e) => {
            push_mic_error(state, connection_id, room_error_code(&e), e.to_string()).await;
        }
    }
}

async fn handle_leave_room(state: &AppState, connection_id: &ConnectionId, room_id: String) {
    let room_id = match RoomId::new(room_id) {
        Ok(room_id) => room_id,
        Err(e) => {
            push_error(state, connection_id, INVALID_PAYLOAD, e.to_string()).await;
            return;
        }
    };

    // The event must name the room the sender is actually in
    match state.registry.get(connection_id).await {
        Some(connection) if connection.room_id() == Some(&room_id) => {}
        _ => {
            push_error(
                state,
                connection_id,
                room_error_code(&RoomError::NotAMember),
                RoomError::NotAMember.to_string(),
            )
            .await;
            return;
        }
    }

    if let Some(outcome) = state.leave_room_usecase.execute(connection_id).await {
        broadcast_leave(state, &outcome).await;
    }
}

/// Fan out a leave outcome: slot-freed notice, system line, member update.
/// Shared by the explicit leave handler and disconnect cleanup.
async fn broadcast_leave(state: &AppState, outcome: &LeaveRoomOutcome) {
    if outcome.notify_targets.is_empty() {
        return;
    }

    if let Some(freed) = outcome.freed_slot {
        broadcast(
            state,
            &outcome.notify_targets,
            &ServerEvent::UserLeftMic {
                slot: freed,
                user_name: outcome.member.name.as_str().to_string(),
            },
        )
        .await;
        match state.store.mic_slots(&outcome.room_id).await {
            Ok(slots) => {
                broadcast(
                    state,
                    &outcome.notify_targets,
                    &ServerEvent::MicUpdate {
                        slots: slot_map(&slots),
                    },
                )
                .await;
            }
            Err(e) => tracing::warn!("Failed to read slots after leave: {}", e),
        }
    }

    if let Some(message) = &outcome.left_message {
        broadcast(state, &outcome.notify_targets, &ServerEvent::from(message)).await;
    }

    broadcast(
        state,
        &outcome.notify_targets,
        &ServerEvent::MemberUpdate {
            members: member_infos(&outcome.remaining),
        },
    )
    .await;
}

async fn handle_get_user_slot(
    state: &AppState,
    connection_id: &ConnectionId,
    room_id: String,
    user_name: String,
) {
    let (room_id, name) = match (RoomId::new(room_id), DisplayName::new(user_name)) {
        (Ok(room_id), Ok(name)) => (room_id, name),
        (Err(e), _) | (_, Err(e)) => {
            push_error(state, connection_id, INVALID_PAYLOAD, e.to_string()).await;
            return;
        }
    };

    // Answered only when the user actually holds a slot
    if let Ok(Some(slot)) = state.get_user_slot_usecase.execute(&room_id, &name).await {
        push(
            state,
            connection_id,
            &ServerEvent::UserSlotInfo {
                user_name: name.into_string(),
                slot,
            },
        )
        .await;
    }
}

async fn handle_forward(
    state: &AppState,
    connection_id: &ConnectionId,
    target: String,
    build_event: impl FnOnce(String) -> ServerEvent,
) {
    let target = match ConnectionId::new(target) {
        Ok(target) => target,
        Err(e) => {
            push_error(state, connection_id, INVALID_PAYLOAD, e.to_string()).await;
            return;
        }
    };

    let event = build_event(connection_id.as_str().to_string());
    let Some(json) = encode(&event) else { return };

    // Best-effort: a missing target means the peer is gone, which the
    // signaling layer above handles via timeout
    state.forward_signal_usecase.execute(&target, &json).await;
}
