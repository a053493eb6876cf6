mod config;
mod error;
mod game;
mod projector;
mod registry;
mod session;
mod types;
mod words;

use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;

use crate::registry::Registry;
use crate::session::Session;
use crate::types::*;

#[derive(Clone)]
struct AppState {
    registry: Arc<Registry>,
}

// ─── Routes ───────────────────────────────────────────────────────

async fn index() -> &'static str {
    "Scribble game server is running!"
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Everything bound for this socket goes through one queue, so room
    // events and direct replies keep their order.
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<ServerMsg>();
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        return;
                    }
                }
                Err(e) => tracing::error!("Failed to encode message: {}", e),
            }
        }
    });

    let mut session = Session::new(state.registry.clone(), outbox);
    tracing::info!("WebSocket connected: {}", session.conn_id());

    // Process incoming messages
    while let Some(Ok(msg)) = receiver.next().await {
        let Message::Text(text) = msg else { continue };

        let client_msg: ClientMsg = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Invalid message: {}", e);
                continue;
            }
        };

        session.dispatch(client_msg).await;
    }

    // Socket disconnected
    tracing::info!("WebSocket disconnected: {}", session.conn_id());
    session.close().await;
    writer.abort();
}

// ─── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = config::init() {
        tracing::error!("Failed to initialize config directory: {}", e);
    }

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    let game_config = config::load_game_config();
    let words = config::load_words();
    tracing::info!(
        "Game config: {} rounds, {} players max, {}s to draw",
        game_config.total_rounds,
        game_config.max_players,
        game_config.draw_seconds
    );

    let state = AppState {
        registry: Registry::new(game_config, words),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind port {}: {}", port, e);
            return;
        }
    };

    tracing::info!("Scribble server running on port {}", port);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
