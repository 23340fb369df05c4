//! Scoring worker loop.
//!
//! A `tokio::select!` over a cancellation token and the next unit of work,
//! so shutdown drains in-flight work instead of dropping it mid-event.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::broadcast::Broadcaster;
use crate::pipeline::coordinator::IncomingAccess;
use crate::pipeline::{PipelineResult, QueuedAccess, ThreatDetectionPipeline};
use crate::queue::Receiver;
use crate::store::Store;
use crate::types::enums::{Action, RiskLevel, Sensitivity};
use crate::types::{Alert, Document, ModificationRecord};

/// One worker: drains the queue, runs the pipeline, persists, and broadcasts.
/// Never crashes on a bad event — requires the loop to log and
/// continue rather than propagate a single event's failure to the process.
pub struct Worker {
    pipeline: Mutex<ThreatDetectionPipeline>,
    store: Arc<dyn Store>,
    broadcaster: Broadcaster,
}

impl Worker {
    pub fn new(store: Arc<dyn Store>, broadcaster: Broadcaster) -> Self {
        Self {
            pipeline: Mutex::new(ThreatDetectionPipeline::new()),
            store,
            broadcaster,
        }
    }

    pub async fn run(&self, mut queue: Receiver<QueuedAccess>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("worker received shutdown signal, draining remaining events");
                    while let Ok(Some(queued)) = tokio::time::timeout(std::time::Duration::from_millis(50), queue.take()).await {
                        self.process(queued).await;
                    }
                    break;
                }
                maybe_queued = queue.take() => {
                    match maybe_queued {
                        Some(queued) => self.process(queued).await,
                        None => {
                            tracing::warn!("event queue closed, worker exiting");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn process(&self, queued: QueuedAccess) {
        let access_for_diff = queued.access.clone();
        let event_id_for_diff = queued.event_id.clone();

        let result = {
            let mut pipeline = self.pipeline.lock().expect("pipeline mutex poisoned");
            pipeline.run(queued.access, queued.event_id, queued.timestamp)
        };

        if matches!(result.event.action, crate::types::enums::Action::Modify | crate::types::enums::Action::Upload) {
            if let (Some(original), Some(modified)) = (&access_for_diff.baseline_content, &access_for_diff.content) {
                let counts = crate::pipeline::diff::compute_diff(original, modified);
                let original_length = original.chars().count();
                let modified_length = modified.chars().count();
                let record = ModificationRecord {
                    modification_id: uuid::Uuid::new_v4().simple().to_string(),
                    event_id: event_id_for_diff,
                    document_id: access_for_diff.document_id.clone().unwrap_or_default(),
                    original_content: original.clone(),
                    modified_content: modified.clone(),
                    original_length,
                    modified_length,
                    chars_added: counts.chars_added,
                    chars_removed: counts.chars_removed,
                    change_percent: ModificationRecord::compute_change_percent(original_length, counts.chars_added, counts.chars_removed),
                    is_cross_department: result.event.is_cross_department,
                    risk_score: result.event.risk_score,
                    risk_level: result.event.risk_level,
                };
                self.record_modification(record).await;
            }
        }

        if matches!(result.event.action, Action::Modify | Action::Upload) {
            self.sync_document(&access_for_diff, &result).await;
        }

        if let Err(e) = self.store.put_event(&result.event).await {
            tracing::error!(error = %e, "failed to persist event, continuing");
        }

        if let Some(explanation) = &result.behavior_explanation {
            if let Err(e) = self.store.put_explanation(explanation).await {
                tracing::error!(error = %e, "failed to persist behavior explanation");
            }
        }
        if let Some(explanation) = &result.document_explanation {
            if let Err(e) = self.store.put_explanation(explanation).await {
                tracing::error!(error = %e, "failed to persist document explanation");
            }
        }

        if let Some(summary) = &result.alert_summary {
            let alert = Alert {
                alert_id: uuid::Uuid::new_v4().simple().to_string(),
                event_id: result.event.event_id.clone(),
                actor_id: result.event.actor_id.clone(),
                priority: result.event.risk_level,
                risk_score: result.event.risk_score,
                summary: summary.clone(),
                details: alert_details(&result),
                status: crate::types::enums::AlertStatus::Open,
                assigned_to: None,
                resolution_notes: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
                resolved_at: None,
            };
            if let Err(e) = self.store.put_alert(&alert).await {
                tracing::error!(error = %e, "failed to persist alert");
            }
            self.broadcaster.broadcast_alert(alert).await;
        }

        self.broadcaster.broadcast_event(result.event).await;
    }

    /// Create or update the `Document` record for a modify/upload event:
    /// first upload establishes the baseline hash and declared sensitivity;
    /// later modifies refresh the current hash,
    /// tamper state, and — on a fresh upload — the predicted sensitivity and
    /// mismatch flag.
    async fn sync_document(&self, access: &IncomingAccess, result: &PipelineResult) {
        let Some(document_id) = access.document_id.clone() else { return };

        let existing = match self.store.get_document(&document_id).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(error = %e, "failed to load document, skipping document sync");
                return;
            }
        };

        let mut document = match existing {
            Some(doc) => doc,
            None => {
                let hash = if !result.integrity.current_hash.is_empty() {
                    result.integrity.current_hash.clone()
                } else {
                    access.content.as_deref().map(crate::pipeline::integrity::IntegrityVerifier::compute_hash).unwrap_or_default()
                };
                let mut doc = Document::new(
                    document_id.clone(),
                    document_id.clone(),
                    access.target_department.clone(),
                    access.declared_sensitivity.unwrap_or(Sensitivity::Internal),
                    hash,
                    access.bytes_transferred,
                );
                doc.baseline_content = access.content.clone();
                doc
            }
        };

        document.current_hash = if !result.integrity.current_hash.is_empty() {
            result.integrity.current_hash.clone()
        } else {
            document.current_hash
        };
        document.current_content = access.content.clone().or(document.current_content);
        document.is_tampered = document.is_tampered || result.integrity.is_tampered;
        document.tamper_severity = result.integrity.severity;

        if let Some(mismatch) = result.sensitivity_mismatch {
            document.predicted_sensitivity = Some(mismatch.predicted);
            document.prediction_confidence = Some(mismatch.confidence);
            document.refresh_mismatch();
        }

        if let Err(e) = self.store.put_document(&document).await {
            tracing::error!(error = %e, "failed to persist document");
        }
    }

    /// Record a modify/upload diff summary. The diff itself
    /// (opcode-based char add/remove counts) is computed here rather than in
    /// the main pipeline, since it depends only on the two raw content
    /// strings already carried by the queued access and not on any other
    /// scoring component.
    pub async fn record_modification(&self, record: ModificationRecord) {
        if let Err(e) = self.store.put_modification(&record).await {
            tracing::error!(error = %e, "failed to persist modification record");
        }
    }
}

fn alert_details(result: &PipelineResult) -> std::collections::HashMap<String, serde_json::Value> {
    let mut details = std::collections::HashMap::new();
    details.insert(
        "primary_risk_factor".to_string(),
        serde_json::json!(result.risk_factors.first().cloned().unwrap_or_default()),
    );
    details.insert("risk_factors".to_string(), serde_json::json!(result.risk_factors));
    details.insert("is_cross_department".to_string(), serde_json::json!(result.event.is_cross_department));
    details.insert("is_anomalous".to_string(), serde_json::json!(result.event.behavior_score >= 0.6));
    details.insert("risk_level".to_string(), serde_json::json!(format_risk_level(result.event.risk_level)));
    details
}

fn format_risk_level(level: RiskLevel) -> &'static str {
    level.as_str()
}
