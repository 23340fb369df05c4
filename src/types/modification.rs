use serde::{Deserialize, Serialize};

use super::enums::RiskLevel;

/// Diff summary of a document modify/upload event.
/// `change_percent` is computed once at creation from opcode-level char
/// deltas, not recomputed from the stored content later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModificationRecord {
    pub modification_id: String,
    pub event_id: String,
    pub document_id: String,
    pub original_content: String,
    pub modified_content: String,
    pub original_length: usize,
    pub modified_length: usize,
    pub chars_added: usize,
    pub chars_removed: usize,
    pub change_percent: f64,
    pub is_cross_department: bool,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

impl ModificationRecord {
    /// `change_percent = (added + removed) / max(original_length, 1) * 100`.
    pub fn compute_change_percent(original_length: usize, chars_added: usize, chars_removed: usize) -> f64 {
        let denom = original_length.max(1) as f64;
        (chars_added + chars_removed) as f64 / denom * 100.0
    }
}
