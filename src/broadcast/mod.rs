//! Real-time WebSocket fan-out.
//!
//! A session table keyed by actor id, best-effort at-most-once delivery,
//! and silent removal of sessions whose socket has gone away.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, RwLock};

use crate::types::{Alert, Event};

/// Outbound message shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WsMessage {
    ConnectionEstablished { actor_id: String },
    NewEvent(Box<Event>),
    NewAlert(Box<Alert>),
    SystemStatus { queue_utilization_percent: f64 },
    Pong,
}

type Session = mpsc::UnboundedSender<WsMessage>;

/// Live session registry. Cheaply cloneable; shared between the axum state
/// and the worker loop.
#[derive(Clone, Default)]
pub struct Broadcaster {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session and return the welcome message plus a receiver
    /// the caller's websocket task should forward to the socket.
    pub async fn connect(&self, actor_id: &str) -> (WsMessage, mpsc::UnboundedReceiver<WsMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions.write().await.insert(actor_id.to_string(), tx);
        (WsMessage::ConnectionEstablished { actor_id: actor_id.to_string() }, rx)
    }

    pub async fn disconnect(&self, actor_id: &str) {
        self.sessions.write().await.remove(actor_id);
    }

    /// Fan a message out to every live session, silently dropping any whose
    /// receiver has gone away.
    pub async fn broadcast(&self, message: WsMessage) {
        let mut dead = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (actor_id, tx) in sessions.iter() {
                if tx.send(message.clone()).is_err() {
                    dead.push(actor_id.clone());
                }
            }
        }
        if !dead.is_empty() {
            let mut sessions = self.sessions.write().await;
            for actor_id in dead {
                sessions.remove(&actor_id);
            }
        }
    }

    pub async fn broadcast_event(&self, event: Event) {
        self.broadcast(WsMessage::NewEvent(Box::new(event))).await;
    }

    pub async fn broadcast_alert(&self, alert: Alert) {
        self.broadcast(WsMessage::NewAlert(Box::new(alert))).await;
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
