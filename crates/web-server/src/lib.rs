use alerts::{AlertStore, StoredAlert};
use app_config::types::ServerSettings;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State,
    },
    response::Json,
    routing::get,
    Router,
};
use events::{WsCache, WsMessage};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use types::{HistoryParams, StatusInfo};

pub mod error;
pub mod types;

// Re-export our custom error type for convenience.
pub use error::{Error, Result};

/// The shared application state that is available to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AlertStore>,
    pub status: StatusInfo,
    pub ws_tx: broadcast::Sender<WsMessage>, // For broadcasting live messages
    pub ws_cache: WsCache,                   // For replaying recent messages
}

/// Creates the main application router with all routes and middleware.
pub fn create_router(app_state: AppState) -> Router {
    // Allow the dashboard frontend to be served from anywhere during
    // development.
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let api_router = Router::new()
        .route("/alerts", get(get_alerts_handler))
        .route("/status", get(get_status_handler));

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check_handler))
        .nest("/api", api_router)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// A simple health check handler.
async fn health_check_handler() -> &'static str {
    "OK"
}

/// Handler for `GET /api/alerts?limit=N`: the persisted alert history,
/// newest first.
async fn get_alerts_handler(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<StoredAlert>> {
    Json(state.store.load(params.limit))
}

/// Handler for `GET /api/status`.
async fn get_status_handler(State(state): State<AppState>) -> Json<StatusInfo> {
    Json(state.status.clone())
}

/// The handler for `GET /ws`.
/// Upgrades the connection to a WebSocket and handles the real-time communication.
async fn ws_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// The actual WebSocket handling logic after the connection is upgraded.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("New WebSocket client connected.");

    // --- 1. The "Replay" ---
    // Get a lock on the cache and clone all historical messages to a local vector.
    let replay_msgs: Vec<_> = {
        let cache = state.ws_cache.lock().unwrap();
        cache.iter().cloned().collect()
    };
    for msg in replay_msgs {
        let json_msg = serde_json::to_string(&msg).unwrap();
        if socket.send(Message::Text(json_msg.into())).await.is_err() {
            // Client disconnected before replay was finished.
            tracing::info!("WebSocket client disconnected during replay.");
            return;
        }
    }

    // --- 2. "Going Live" ---
    // Subscribe to the broadcast channel to receive new, live messages.
    let mut rx = state.ws_tx.subscribe();

    // The main loop for this client.
    loop {
        tokio::select! {
            // Await a new message from the broadcast channel.
            Ok(msg) = rx.recv() => {
                let json_msg = serde_json::to_string(&msg).unwrap();
                if socket.send(Message::Text(json_msg.into())).await.is_err() {
                    // Client disconnected. Break the loop.
                    tracing::info!("WebSocket client disconnected.");
                    break;
                }
            }
            // Await a message from the client (e.g., a ping or a close frame).
            Some(Ok(msg)) = socket.next() => {
                if let Message::Close(_) = msg {
                    tracing::info!("WebSocket client sent close frame.");
                    break;
                }
            }
            // If both channels are closed, the select macro will terminate.
            else => {
                break;
            }
        }
    }
    tracing::info!("WebSocket client connection closed.");
}

/// The main entry point for running the web server.
///
/// This function sets up the TCP listener and serves the application router.
/// It will run forever until the process is terminated.
pub async fn run(settings: &ServerSettings, app_state: AppState) -> Result<()> {
    let app = create_router(app_state);

    let address = format!("{}:{}", settings.host, settings.port);
    tracing::info!("Web server listening on {}", address);

    let listener = TcpListener::bind(&address)
        .await
        .map_err(Error::ServerBindError)?;

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(Error::ServerBindError)?;

    Ok(())
}
