//! Persistence layer.
//!
//! A small async-trait seam in front of swappable backends, so the worker
//! and API handlers never depend on sled directly.

mod memory_store;
mod sled_store;

pub use memory_store::MemoryStore;
pub use sled_store::SledStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Actor, Alert, Document, Event, Explanation, ModificationRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Storage seam implemented by every persistence backend.
#[async_trait]
pub trait Store: Send + Sync {
    async fn put_actor(&self, actor: &Actor) -> Result<(), StoreError>;
    async fn get_actor(&self, actor_id: &str) -> Result<Option<Actor>, StoreError>;

    async fn put_document(&self, document: &Document) -> Result<(), StoreError>;
    async fn get_document(&self, document_id: &str) -> Result<Option<Document>, StoreError>;

    async fn put_event(&self, event: &Event) -> Result<(), StoreError>;
    async fn list_events_for_actor(&self, actor_id: &str) -> Result<Vec<Event>, StoreError>;

    async fn put_alert(&self, alert: &Alert) -> Result<(), StoreError>;
    async fn list_alerts(&self) -> Result<Vec<Alert>, StoreError>;
    async fn update_alert_status(
        &self,
        alert_id: &str,
        status: crate::types::enums::AlertStatus,
        resolution_notes: Option<String>,
    ) -> Result<(), StoreError>;

    async fn put_explanation(&self, explanation: &Explanation) -> Result<(), StoreError>;
    async fn get_explanation_for_event(&self, event_id: &str) -> Result<Option<Explanation>, StoreError>;

    async fn put_modification(&self, modification: &ModificationRecord) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}
