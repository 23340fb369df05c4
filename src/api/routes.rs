//! Route table for the external interfaces.

use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use super::state::AppState;
use super::ws;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/events/ingest", post(handlers::ingest))
        .route("/events/queue/status", get(handlers::queue_status))
        .route("/auth/refresh", post(handlers::refresh))
        .route("/ws/admin", get(ws::ws_admin))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::Broadcaster;
    use crate::config::{self, Settings};
    use crate::queue;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn ensure_config() {
        if !config::is_initialized() {
            config::init(Settings::from_env());
        }
    }

    fn test_state() -> AppState {
        ensure_config();
        let (tx, _rx) = queue::bounded(10, 0.9);
        AppState {
            queue: tx,
            store: Arc::new(MemoryStore::default()),
            broadcaster: Broadcaster::new(),
        }
    }

    #[tokio::test]
    async fn ingest_without_bearer_token_is_unauthorized() {
        let app = routes(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/events/ingest")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn queue_status_reports_empty_queue() {
        let app = routes(test_state());
        let response = app
            .oneshot(Request::builder().uri("/events/queue/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
