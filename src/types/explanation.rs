use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::enums::ExplanationType;

/// Per-event interpretability artifact.
///
/// `behavior_attributions` holds signed feature contributions keyed by
/// feature name (SHAP-style); `document_attributions` holds ordered
/// (token, signed weight) pairs (LIME-style) and is only populated when the
/// event carried document content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub explanation_id: String,
    pub event_id: String,
    pub explanation_type: ExplanationType,
    pub behavior_attributions: HashMap<String, f64>,
    pub baseline_expected_value: f64,
    pub document_attributions: Vec<(String, f64)>,
    pub component_scores: HashMap<String, f64>,
}
