use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::state::AppState;

pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

#[instrument(skip(state, ws))]
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| forward_events(socket, state))
}

async fn forward_events(mut socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    let mut events = state.notifier.subscribe();
    info!(%conn_id, "websocket connected");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(payload) => {
                    if socket.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%conn_id, skipped, "websocket subscriber lagging; events skipped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(%conn_id, error = %e, "websocket read failed");
                    break;
                }
            },
        }
    }

    info!(%conn_id, "websocket disconnected");
}
