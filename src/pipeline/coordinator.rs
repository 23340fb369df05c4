//! Pipeline orchestration.
//!
//! Runs the fixed scoring sequence for every incoming access:
//! extract behavior features -> score anomaly -> update history -> classify
//! sensitivity -> check integrity -> determine context flags -> fuse risk ->
//! generate explanations conditionally -> generate alert summary only when
//! required.

use chrono::{Datelike, Utc};

use crate::auth::check_department_access;
use crate::config::defaults::RISK_THRESHOLD_HIGH;
use crate::pipeline::behavior::{BehaviorScorer, HistoryEntry};
use crate::pipeline::explanation::{BehaviorExplainerModel, DocumentExplainer};
use crate::pipeline::fusion::{RiskFusionEngine, RiskInputs};
use crate::pipeline::integrity::{IntegrityResult, IntegrityVerifier};
use crate::pipeline::sensitivity::{ClassificationResult, SensitivityClassifier};
use crate::types::enums::{Action, Department, ExplanationType, Sensitivity};
use crate::types::{Event, Explanation};

/// Outcome of comparing a declared upload sensitivity to the predicted one.
/// Only populated for uploads that declared a sensitivity.
#[derive(Debug, Clone, Copy)]
pub struct SensitivityMismatch {
    pub predicted: Sensitivity,
    pub confidence: f64,
    pub risk_modifier: f64,
    pub flagged: bool,
}

/// A single ingest-time request before it becomes a persisted [`Event`].
#[derive(Debug, Clone)]
pub struct IncomingAccess {
    pub actor_id: String,
    pub actor_department: Department,
    pub action: Action,
    pub document_id: Option<String>,
    pub target_department: Department,
    pub bytes_transferred: u64,
    pub source_ip: Option<String>,
    pub device_info: Option<String>,
    pub session_id: Option<String>,
    pub baseline_hash: Option<String>,
    pub baseline_content: Option<String>,
    pub content: Option<String>,
    /// Sensitivity the uploader claims for the document.
    /// Only meaningful on [`Action::Upload`].
    pub declared_sensitivity: Option<Sensitivity>,
}

/// What actually travels through the queue: the event-id and timestamp are
/// minted synchronously at ingest, before the access request has been scored.
#[derive(Debug, Clone)]
pub struct QueuedAccess {
    pub event_id: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub access: IncomingAccess,
}

/// Everything the worker needs after one event has been fully scored.
pub struct PipelineResult {
    pub event: Event,
    pub classification: ClassificationResult,
    pub integrity: IntegrityResult,
    pub behavior_explanation: Option<Explanation>,
    pub document_explanation: Option<Explanation>,
    pub alert_summary: Option<String>,
    pub risk_factors: Vec<String>,
    pub sensitivity_mismatch: Option<SensitivityMismatch>,
}

/// Wires the four scoring components together.
pub struct ThreatDetectionPipeline {
    behavior_scorer: BehaviorScorer,
    behavior_explainer: BehaviorExplainerModel,
    sensitivity_classifier: SensitivityClassifier,
    integrity_verifier: IntegrityVerifier,
    risk_engine: RiskFusionEngine,
}

impl ThreatDetectionPipeline {
    /// No training corpus ships with the service, so `behavior_scorer` starts
    /// unfitted and `score_event` reports every actor as neutral (score 0)
    /// until `behavior_scorer_mut().fit(..)` is called with a real batch of
    /// feature vectors, e.g. from a nightly batch job over recent history.
    /// That neutral path is the expected steady state for a freshly deployed
    /// instance, not a bug to be silently masked with a nonzero default.
    pub fn new() -> Self {
        Self {
            behavior_scorer: BehaviorScorer::new(),
            behavior_explainer: BehaviorExplainerModel::fit(&[]),
            sensitivity_classifier: SensitivityClassifier::new(),
            integrity_verifier: IntegrityVerifier::new(),
            risk_engine: RiskFusionEngine::new(crate::config::get().risk_weights),
        }
    }

    pub fn behavior_scorer_mut(&mut self) -> &mut BehaviorScorer {
        &mut self.behavior_scorer
    }

    /// Run the full scoring sequence for one incoming access.
    pub fn run(&mut self, access: IncomingAccess, event_id: String, timestamp: chrono::DateTime<Utc>) -> PipelineResult {
        let access_check = check_department_access(&access.actor_department, &access.target_department, access.action);

        let entry = HistoryEntry {
            timestamp,
            action: access.action,
            bytes_transferred: access.bytes_transferred,
            document_id: access.document_id.clone(),
            is_cross_department: access_check.is_cross_department,
            sensitivity: None,
            source_ip: access.source_ip.clone(),
            device_info: access.device_info.clone(),
            session_id: access.session_id.clone(),
        };

        let (behavior_score, features) = self.behavior_scorer.score_event(&access.actor_id, entry);

        // Classify sensitivity — default neutral when there's no content to inspect.
        let classification = match &access.content {
            Some(content) => self.sensitivity_classifier.classify(content),
            None => ClassificationResult {
                predicted: crate::types::enums::Sensitivity::Internal,
                confidence: 0.5,
                source: crate::pipeline::sensitivity::ClassificationSource::Default,
            },
        };
        let mut classification_score = SensitivityClassifier::risk_score(classification);

        // Upload sensitivity mismatch: compare the declared
        // level against the predicted one on the public<internal<confidential
        // hierarchy and fold a risk modifier into the classification score.
        let sensitivity_mismatch = match (access.action, access.declared_sensitivity) {
            (Action::Upload, Some(declared)) => {
                let declared_rank = declared.rank();
                let predicted_rank = classification.predicted.rank();
                let mismatch = if predicted_rank > declared_rank {
                    SensitivityMismatch {
                        predicted: classification.predicted,
                        confidence: classification.confidence,
                        risk_modifier: 0.3 * (predicted_rank - declared_rank) as f64 * classification.confidence,
                        flagged: true,
                    }
                } else if declared_rank > predicted_rank {
                    SensitivityMismatch {
                        predicted: classification.predicted,
                        confidence: classification.confidence,
                        risk_modifier: 0.05 * classification.confidence,
                        flagged: false,
                    }
                } else {
                    SensitivityMismatch {
                        predicted: classification.predicted,
                        confidence: classification.confidence,
                        risk_modifier: 0.0,
                        flagged: false,
                    }
                };
                classification_score = (classification_score + mismatch.risk_modifier).min(1.0);
                Some(mismatch)
            }
            _ => None,
        };

        // Integrity is only meaningful for modify/upload against a registered baseline.
        // Tampering itself is detectable from the hash alone; the cached baseline
        // content (when we still have it) only sharpens severity beyond "unknown".
        let integrity = match (access.action, &access.baseline_hash, &access.content) {
            (Action::Modify | Action::Upload, Some(baseline_hash), Some(content)) => match &access.baseline_content {
                Some(baseline_content) => self.integrity_verifier.check(baseline_hash, baseline_content, content),
                None => self.integrity_verifier.check_hash_only(baseline_hash, content),
            },
            _ => IntegrityResult::neutral(),
        };
        let integrity_score = integrity.severity.risk_score();

        let is_after_hours = !(8..=18).contains(&timestamp.format("%H").to_string().parse::<i64>().unwrap_or(0));
        let is_weekend = timestamp.weekday().num_days_from_monday() >= 5;

        let assessment = self.risk_engine.compute_risk(RiskInputs {
            behavior_score,
            classification_score,
            integrity_score,
            action: access.action,
            is_cross_department: access_check.is_cross_department,
            is_after_hours,
            is_weekend,
        });

        let behavior_explanation = (behavior_score >= RISK_THRESHOLD_HIGH * 0.75).then(|| {
            let (baseline, attributions) = self.behavior_explainer.explain(features);
            Explanation {
                explanation_id: uuid::Uuid::new_v4().simple().to_string(),
                event_id: event_id.clone(),
                explanation_type: ExplanationType::BehaviorShap,
                behavior_attributions: attributions,
                baseline_expected_value: baseline,
                document_attributions: Vec::new(),
                component_scores: assessment.components.clone(),
            }
        });

        let document_explanation = access.content.as_deref().map(|content| Explanation {
            explanation_id: uuid::Uuid::new_v4().simple().to_string(),
            event_id: event_id.clone(),
            explanation_type: ExplanationType::DocumentLime,
            behavior_attributions: Default::default(),
            baseline_expected_value: classification.confidence,
            document_attributions: DocumentExplainer::explain(content),
            component_scores: assessment.components.clone(),
        });

        let alert_summary = assessment.requires_alert.then(|| {
            RiskFusionEngine::generate_alert_summary(
                &assessment,
                &access.actor_id,
                access.action,
                access.document_id.as_deref().unwrap_or("unknown"),
            )
        });

        let event = Event {
            event_id,
            actor_id: access.actor_id,
            actor_department: access.actor_department,
            action: access.action,
            document_id: access.document_id,
            target_department: Some(access.target_department),
            timestamp,
            bytes_transferred: access.bytes_transferred,
            source_ip: access.source_ip,
            device_info: access.device_info,
            session_id: access.session_id,
            is_cross_department: access_check.is_cross_department,
            behavior_score,
            risk_score: assessment.score,
            risk_level: assessment.level,
        };

        PipelineResult {
            event,
            classification,
            integrity,
            behavior_explanation,
            document_explanation,
            alert_summary,
            risk_factors: assessment.risk_factors,
            sensitivity_mismatch,
        }
    }
}

impl Default for ThreatDetectionPipeline {
    fn default() -> Self {
        Self::new()
    }
}
