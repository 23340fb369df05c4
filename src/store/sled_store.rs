use std::path::Path;

use async_trait::async_trait;

use super::{Store, StoreError};
use crate::types::enums::AlertStatus;
use crate::types::{Actor, Alert, Document, Event, Explanation, ModificationRecord};

/// Sled-backed persistence. One tree per entity kind, keyed by id; events are
/// additionally keyed with a nanosecond timestamp prefix so iteration comes
/// back in insertion order.
pub struct SledStore {
    actors: sled::Tree,
    documents: sled::Tree,
    events: sled::Tree,
    alerts: sled::Tree,
    explanations: sled::Tree,
    modifications: sled::Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            actors: db.open_tree("actors").map_err(|e| StoreError::Backend(e.to_string()))?,
            documents: db.open_tree("documents").map_err(|e| StoreError::Backend(e.to_string()))?,
            events: db.open_tree("events").map_err(|e| StoreError::Backend(e.to_string()))?,
            alerts: db.open_tree("alerts").map_err(|e| StoreError::Backend(e.to_string()))?,
            explanations: db
                .open_tree("explanations")
                .map_err(|e| StoreError::Backend(e.to_string()))?,
            modifications: db
                .open_tree("modifications")
                .map_err(|e| StoreError::Backend(e.to_string()))?,
        })
    }
}

fn put<T: serde::Serialize>(tree: &sled::Tree, key: &str, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value)?;
    tree.insert(key.as_bytes(), bytes)
        .map_err(|e| StoreError::Backend(e.to_string()))?;
    Ok(())
}

fn get<T: serde::de::DeserializeOwned>(tree: &sled::Tree, key: &str) -> Result<Option<T>, StoreError> {
    match tree.get(key.as_bytes()).map_err(|e| StoreError::Backend(e.to_string()))? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

fn scan<T: serde::de::DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<T>, StoreError> {
    tree.iter()
        .values()
        .map(|res| {
            let bytes = res.map_err(|e| StoreError::Backend(e.to_string()))?;
            Ok(serde_json::from_slice(&bytes)?)
        })
        .collect()
}

#[async_trait]
impl Store for SledStore {
    async fn put_actor(&self, actor: &Actor) -> Result<(), StoreError> {
        put(&self.actors, &actor.actor_id, actor)
    }

    async fn get_actor(&self, actor_id: &str) -> Result<Option<Actor>, StoreError> {
        get(&self.actors, actor_id)
    }

    async fn put_document(&self, document: &Document) -> Result<(), StoreError> {
        put(&self.documents, &document.document_id, document)
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>, StoreError> {
        get(&self.documents, document_id)
    }

    async fn put_event(&self, event: &Event) -> Result<(), StoreError> {
        let key = format!("{}:{}", event.timestamp.timestamp_nanos_opt().unwrap_or(0), event.event_id);
        put(&self.events, &key, event)
    }

    async fn list_events_for_actor(&self, actor_id: &str) -> Result<Vec<Event>, StoreError> {
        let all: Vec<Event> = scan(&self.events)?;
        Ok(all.into_iter().filter(|e| e.actor_id == actor_id).collect())
    }

    async fn put_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        put(&self.alerts, &alert.alert_id, alert)
    }

    async fn list_alerts(&self) -> Result<Vec<Alert>, StoreError> {
        scan(&self.alerts)
    }

    async fn update_alert_status(
        &self,
        alert_id: &str,
        status: AlertStatus,
        resolution_notes: Option<String>,
    ) -> Result<(), StoreError> {
        let mut alert: Alert = get(&self.alerts, alert_id)?.ok_or_else(|| StoreError::NotFound(alert_id.to_string()))?;
        alert.status = status;
        alert.updated_at = chrono::Utc::now();
        if matches!(status, AlertStatus::Resolved | AlertStatus::Dismissed) {
            alert.resolved_at = Some(chrono::Utc::now());
        }
        if resolution_notes.is_some() {
            alert.resolution_notes = resolution_notes;
        }
        put(&self.alerts, alert_id, &alert)
    }

    async fn put_explanation(&self, explanation: &Explanation) -> Result<(), StoreError> {
        put(&self.explanations, &explanation.explanation_id, explanation)
    }

    async fn get_explanation_for_event(&self, event_id: &str) -> Result<Option<Explanation>, StoreError> {
        let all: Vec<Explanation> = scan(&self.explanations)?;
        Ok(all.into_iter().find(|e| e.event_id == event_id))
    }

    async fn put_modification(&self, modification: &ModificationRecord) -> Result<(), StoreError> {
        put(&self.modifications, &modification.modification_id, modification)
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::enums::{Department, Role};

    #[tokio::test]
    async fn open_and_round_trip_actor() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        let actor = Actor::new("u1", "alice", Department::new("finance"), Role::User);
        store.put_actor(&actor).await.unwrap();
        let fetched = store.get_actor("u1").await.unwrap().unwrap();
        assert_eq!(fetched.username, "alice");
    }
}
