use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Store, StoreError};
use crate::types::enums::AlertStatus;
use crate::types::{Actor, Alert, Document, Event, Explanation, ModificationRecord};

/// In-memory backend for tests and local bootstrapping where a sled
/// directory would be unwanted.
#[derive(Default)]
pub struct MemoryStore {
    actors: RwLock<HashMap<String, Actor>>,
    documents: RwLock<HashMap<String, Document>>,
    events: RwLock<Vec<Event>>,
    alerts: RwLock<Vec<Alert>>,
    explanations: RwLock<Vec<Explanation>>,
    modifications: RwLock<Vec<ModificationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put_actor(&self, actor: &Actor) -> Result<(), StoreError> {
        self.actors.write().await.insert(actor.actor_id.clone(), actor.clone());
        Ok(())
    }

    async fn get_actor(&self, actor_id: &str) -> Result<Option<Actor>, StoreError> {
        Ok(self.actors.read().await.get(actor_id).cloned())
    }

    async fn put_document(&self, document: &Document) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .insert(document.document_id.clone(), document.clone());
        Ok(())
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.read().await.get(document_id).cloned())
    }

    async fn put_event(&self, event: &Event) -> Result<(), StoreError> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn list_events_for_actor(&self, actor_id: &str) -> Result<Vec<Event>, StoreError> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.actor_id == actor_id)
            .cloned()
            .collect())
    }

    async fn put_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        self.alerts.write().await.push(alert.clone());
        Ok(())
    }

    async fn list_alerts(&self) -> Result<Vec<Alert>, StoreError> {
        Ok(self.alerts.read().await.clone())
    }

    async fn update_alert_status(
        &self,
        alert_id: &str,
        status: AlertStatus,
        resolution_notes: Option<String>,
    ) -> Result<(), StoreError> {
        let mut alerts = self.alerts.write().await;
        let alert = alerts
            .iter_mut()
            .find(|a| a.alert_id == alert_id)
            .ok_or_else(|| StoreError::NotFound(alert_id.to_string()))?;
        alert.status = status;
        alert.updated_at = chrono::Utc::now();
        if matches!(status, AlertStatus::Resolved | AlertStatus::Dismissed) {
            alert.resolved_at = Some(chrono::Utc::now());
        }
        if resolution_notes.is_some() {
            alert.resolution_notes = resolution_notes;
        }
        Ok(())
    }

    async fn put_explanation(&self, explanation: &Explanation) -> Result<(), StoreError> {
        self.explanations.write().await.push(explanation.clone());
        Ok(())
    }

    async fn get_explanation_for_event(&self, event_id: &str) -> Result<Option<Explanation>, StoreError> {
        Ok(self
            .explanations
            .read()
            .await
            .iter()
            .find(|e| e.event_id == event_id)
            .cloned())
    }

    async fn put_modification(&self, modification: &ModificationRecord) -> Result<(), StoreError> {
        self.modifications.write().await.push(modification.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::enums::{Action, Department, Role, RiskLevel};

    fn sample_actor() -> Actor {
        Actor::new("u1", "alice", Department::new("finance"), Role::User)
    }

    fn sample_event() -> Event {
        Event {
            event_id: "e1".into(),
            actor_id: "u1".into(),
            actor_department: Department::new("finance"),
            action: Action::View,
            document_id: None,
            target_department: None,
            timestamp: chrono::Utc::now(),
            bytes_transferred: 0,
            source_ip: None,
            device_info: None,
            session_id: None,
            is_cross_department: false,
            behavior_score: 0.1,
            risk_score: 0.1,
            risk_level: RiskLevel::Low,
        }
    }

    #[tokio::test]
    async fn put_and_get_actor_round_trips() {
        let store = MemoryStore::new();
        store.put_actor(&sample_actor()).await.unwrap();
        let fetched = store.get_actor("u1").await.unwrap().unwrap();
        assert_eq!(fetched.username, "alice");
    }

    #[tokio::test]
    async fn events_accumulate_append_only() {
        let store = MemoryStore::new();
        store.put_event(&sample_event()).await.unwrap();
        store.put_event(&sample_event()).await.unwrap();
        let events = store.list_events_for_actor("u1").await.unwrap();
        assert_eq!(events.len(), 2);
    }
}
