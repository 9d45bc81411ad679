//! Signaling relay server for hiroba.
//!
//! Serves room chat, mic slot coordination and WebRTC signaling
//! forwarding over a WebSocket endpoint, plus a small HTTP API.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 0.0.0.0 --port 3000 --mic-slots 8
//! ```
//!
//! Media credential issuance is configured through the
//! `HIROBA_MEDIA_APP_ID` and `HIROBA_MEDIA_SECRET` environment variables;
//! without them the relay runs with guest identities only.

use std::sync::Arc;

use clap::Parser;

use hiroba_server::{
    infrastructure::{
        InMemoryConnectionRegistry, InMemoryRoomStore, WebSocketMessagePusher,
        gateway::hmac::{HmacMediaGateway, MediaGatewayConfig},
    },
    ui::{AppState, Server},
};
use hiroba_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Signaling relay for room chat, mic slots and WebRTC negotiation", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Number of mic slots per room
    #[arg(long, default_value = "10")]
    mic_slots: u8,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger("hiroba-server", env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Ports (store, registry, pusher, gateway)
    // 2. AppState (wires the usecases)
    // 3. Server

    let clock = Arc::new(SystemClock);

    let store = Arc::new(InMemoryRoomStore::new(args.mic_slots, clock.clone()));
    let registry = Arc::new(InMemoryConnectionRegistry::new());
    let pusher = Arc::new(WebSocketMessagePusher::new());

    let media_config = MediaGatewayConfig::from_env();
    let media_configured = media_config.app_id.is_some() && media_config.secret.is_some();
    let gateway = Arc::new(HmacMediaGateway::new(media_config, clock));
    if media_configured {
        tracing::info!("Media credential issuer configured");
    } else {
        tracing::warn!("Media credential issuer not configured, guest identities only");
    }

    let state = Arc::new(AppState::new(store, registry, pusher, gateway));

    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
