//! CLI client for the hiroba signaling relay.
//!
//! Joins a room, sends chat messages from stdin and manages mic slots via
//! slash commands. Automatically reconnects on disconnection (max 5
//! attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-client -- --name Alice --room lobby
//! cargo run --bin hiroba-client -- -n Bob -r lobby -u ws://127.0.0.1:8080/ws
//! ```

use clap::Parser;

use hiroba_client::session::SessionConfig;
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "CLI client for room chat and mic slots over WebSocket", long_about = None)]
struct Args {
    /// Display name in the room
    #[arg(short = 'n', long)]
    name: String,

    /// Room to join
    #[arg(short = 'r', long)]
    room: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Identity token (joins as guest when omitted)
    #[arg(short = 't', long)]
    token: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger("hiroba-client", env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let config = SessionConfig {
        url: args.url,
        room_id: args.room,
        name: args.name,
        identity_token: args.token,
    };

    // Run the client
    if let Err(e) = hiroba_client::run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
