//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use hiroba_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};

use crate::{
    command::{HELP_TEXT, InputCommand, parse_input},
    error::ClientError,
    formatter::EventFormatter,
    ui::redisplay_prompt,
};

/// Connection parameters of one session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub url: String,
    pub room_id: String,
    pub name: String,
    pub identity_token: Option<String>,
}

/// Run the WebSocket client session
pub async fn run_client_session(config: &SessionConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (ws_stream, _response) = connect_async(&config.url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to signaling relay!");
    println!(
        "\nYou are '{}' in room '{}'. Type /help for commands. Press Ctrl+C to exit.\n",
        config.name, config.room_id
    );

    let (mut write, mut read) = ws_stream.split();

    // Join the room right away
    let join = ClientEvent::JoinRoom {
        room_id: config.room_id.clone(),
        user_name: config.name.clone(),
        identity_token: config.identity_token.clone(),
    };
    write
        .send(Message::Text(serde_json::to_string(&join)?.into()))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    let name_for_read = config.name.clone();

    // Spawn a task to handle incoming events
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if let Some(formatted) =
                                EventFormatter::format(&event, &name_for_read)
                            {
                                print!("{}", formatted);
                                redisplay_prompt(&name_for_read);
                            }
                        }
                        Err(_) => {
                            print!("{}", EventFormatter::format_raw(&text));
                            redisplay_prompt(&name_for_read);
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let name_for_prompt = config.name.clone();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", name_for_prompt);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to turn input lines into client events
    let room_id = config.room_id.clone();
    let name = config.name.clone();
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let event = match parse_input(&line) {
                InputCommand::Chat(text) => ClientEvent::SendMessage {
                    room_id: room_id.clone(),
                    text,
                },
                InputCommand::JoinMic(slot) => ClientEvent::JoinMic {
                    room_id: room_id.clone(),
                    slot,
                },
                InputCommand::LeaveMic(slot) => ClientEvent::LeaveMic {
                    room_id: room_id.clone(),
                    slot,
                },
                InputCommand::SlotOf(user_name) => ClientEvent::GetUserSlot {
                    room_id: room_id.clone(),
                    user_name,
                },
                InputCommand::Leave => {
                    let leave = ClientEvent::LeaveRoom {
                        room_id: room_id.clone(),
                    };
                    if let Ok(json) = serde_json::to_string(&leave) {
                        let _ = write.send(Message::Text(json.into())).await;
                    }
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
                InputCommand::Help => {
                    print!("\n{}", HELP_TEXT);
                    redisplay_prompt(&name);
                    continue;
                }
                InputCommand::Invalid(reason) => {
                    print!("\n! {}\n", reason);
                    redisplay_prompt(&name);
                    continue;
                }
            };

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send event: {}", e);
                write_error = true;
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            let connection_error = read_result.unwrap_or(false);
            if connection_error {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            let write_error = write_result.unwrap_or(false);
            if write_error {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
    }

    Ok(())
}
