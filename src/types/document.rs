use serde::{Deserialize, Serialize};

use super::enums::{Department, Sensitivity};

/// A document tracked by the system. `baseline_hash` and `baseline_content`
/// are captured once at registration and never mutated — every later
/// integrity check compares against them, not against the previous observed
/// state, so drift accumulates rather than resets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub filename: String,
    pub department: Department,
    pub declared_sensitivity: Sensitivity,
    pub predicted_sensitivity: Option<Sensitivity>,
    pub prediction_confidence: Option<f64>,
    pub sensitivity_mismatch: bool,
    pub baseline_hash: String,
    pub current_hash: String,
    pub baseline_content: Option<String>,
    pub current_content: Option<String>,
    pub is_tampered: bool,
    pub tamper_severity: crate::types::enums::TamperSeverity,
    pub size_bytes: u64,
}

impl Document {
    pub fn new(
        document_id: impl Into<String>,
        filename: impl Into<String>,
        department: Department,
        declared_sensitivity: Sensitivity,
        baseline_hash: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        let hash = baseline_hash.into();
        Self {
            document_id: document_id.into(),
            filename: filename.into(),
            department,
            declared_sensitivity,
            predicted_sensitivity: None,
            prediction_confidence: None,
            sensitivity_mismatch: false,
            current_hash: hash.clone(),
            baseline_hash: hash,
            baseline_content: None,
            current_content: None,
            is_tampered: false,
            tamper_severity: crate::types::enums::TamperSeverity::None,
            size_bytes,
        }
    }

    /// Recompute `sensitivity_mismatch`: true when the classifier predicted
    /// a *strictly higher* sensitivity rank than the declared one.
    pub fn refresh_mismatch(&mut self) {
        self.sensitivity_mismatch = match self.predicted_sensitivity {
            Some(predicted) => predicted.rank() > self.declared_sensitivity.rank(),
            None => false,
        };
    }
}
