//! WebSocket session handling.
//!
//! `GET /ws/admin?token=<bearer>` upgrades to a bidirectional JSON channel.
//! Connect requires the same bearer validation as ingest; on accept the
//! server sends `connection_established`, then forwards every broadcast
//! message until the socket closes or a send fails.

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::auth::verify_access_token;
use crate::broadcast::WsMessage;

#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: String,
}

/// `GET /ws/admin?token=<bearer>`.
pub async fn ws_admin(
    ws: WebSocketUpgrade,
    Query(query): Query<WsAuthQuery>,
    State(state): State<AppState>,
) -> Response {
    match verify_access_token(&query.token) {
        Ok(identity) => ws.on_upgrade(move |socket| handle_socket(socket, identity.actor_id, state)),
        Err(_) => ws.on_upgrade(|socket| async move {
            close_unauthorized(socket).await;
        }),
    }
}

async fn close_unauthorized(mut socket: WebSocket) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: 1008,
            reason: "invalid or missing bearer token".into(),
        })))
        .await;
}

async fn handle_socket(mut socket: WebSocket, actor_id: String, state: AppState) {
    let (welcome, mut rx) = state.broadcaster.connect(&actor_id).await;
    if socket.send(to_ws_frame(&welcome)).await.is_err() {
        state.broadcaster.disconnect(&actor_id).await;
        return;
    }

    loop {
        tokio::select! {
            outgoing = rx.recv() => {
                match outgoing {
                    Some(message) => {
                        if socket.send(to_ws_frame(&message)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_client_message(&text) {
                            if socket.send(to_ws_frame(&reply)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.broadcaster.disconnect(&actor_id).await;
}

/// Client messages: `ping` gets a `pong`; anything else is ignored — all
/// channels are delivered by default, so there's nothing to subscribe to.
fn handle_client_message(text: &str) -> Option<WsMessage> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    match value.get("type").and_then(|t| t.as_str())? {
        "ping" => Some(WsMessage::Pong),
        _ => None,
    }
}

fn to_ws_frame(message: &WsMessage) -> Message {
    Message::Text(serde_json::to_string(message).unwrap_or_default())
}
