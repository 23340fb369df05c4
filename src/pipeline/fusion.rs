//! Risk fusion.
//!
//! Combines the behavior, sensitivity, and integrity component scores into a
//! single risk score and level, applying action/cross-department/temporal
//! multipliers and a cross-department floor before bucketing.

use std::collections::HashMap;

use crate::config::RiskWeights;
use crate::types::enums::{Action, RiskLevel};

/// Per-action severity multiplier.
fn action_multiplier(action: Action) -> f64 {
    match action {
        Action::View => 1.0,
        Action::Download => 1.8,
        Action::Upload => 1.4,
        Action::Modify => 2.5,
        Action::Delete => 3.0,
        Action::Share => 2.0,
    }
}

/// Escalated multiplier when the action also crosses a department boundary.
fn cross_dept_action_multiplier(action: Action) -> f64 {
    match action {
        Action::View => 1.3,
        Action::Download => 2.0,
        Action::Upload => 1.5,
        Action::Modify => 2.8,
        Action::Delete => 3.5,
        Action::Share => 2.2,
    }
}

/// Minimum risk a cross-department action carries regardless of how benign
/// the other components scored.
fn cross_dept_base_risk(action: Action) -> f64 {
    match action {
        Action::View => 0.15,
        Action::Download => 0.25,
        Action::Upload => 0.20,
        Action::Modify => 0.45,
        Action::Delete => 0.55,
        Action::Share => 0.30,
    }
}

/// Temporal multiplier.
fn temporal_multiplier(after_hours: bool, weekend: bool) -> f64 {
    if weekend {
        1.5
    } else if after_hours {
        1.3
    } else {
        1.0
    }
}

/// Inputs to one fusion call.
#[derive(Debug, Clone, Copy)]
pub struct RiskInputs {
    pub behavior_score: f64,
    pub classification_score: f64,
    pub integrity_score: f64,
    pub action: Action,
    pub is_cross_department: bool,
    pub is_after_hours: bool,
    pub is_weekend: bool,
}

/// Fused outcome.
#[derive(Debug, Clone)]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
    pub primary_risk_factor: String,
    pub risk_factors: Vec<String>,
    pub requires_alert: bool,
    pub components: HashMap<String, f64>,
}

pub struct RiskFusionEngine {
    weights: RiskWeights,
}

impl RiskFusionEngine {
    pub fn new(weights: RiskWeights) -> Self {
        Self { weights }
    }

    /// Compute the fused risk score: weighted base, cross-department floor, then
    /// multiplicative action/cross-dept/temporal escalation, clamped to 1.0.
    pub fn compute_risk(&self, inputs: RiskInputs) -> RiskAssessment {
        let base = inputs.behavior_score * self.weights.behavior
            + inputs.classification_score * self.weights.classification
            + inputs.integrity_score * self.weights.integrity;

        let floored_base = if inputs.is_cross_department {
            base.max(cross_dept_base_risk(inputs.action))
        } else {
            base
        };

        // Base (non-cross-department) multiplier: drives the "high-risk action"
        // factor and alert threshold, which key off the action itself rather
        // than whether this particular access also crossed departments.
        let base_action_mult = action_multiplier(inputs.action);
        let action_mult = if inputs.is_cross_department {
            cross_dept_action_multiplier(inputs.action)
        } else {
            base_action_mult
        };
        let temporal_mult = temporal_multiplier(inputs.is_after_hours, inputs.is_weekend);

        let score = (floored_base * action_mult * temporal_mult).min(1.0);
        let level = RiskLevel::from_score(score);

        let mut risk_factors = Vec::new();

        if inputs.behavior_score > 0.5 {
            risk_factors.push(format!("Anomalous behavior (score: {:.2})", inputs.behavior_score));
        }
        if inputs.is_cross_department {
            risk_factors.push("Cross-department access".to_string());
        }
        let is_high_risk_action =
            matches!(inputs.action, Action::Download | Action::Modify | Action::Delete) && base_action_mult >= 1.5;
        if is_high_risk_action {
            risk_factors.push(format!("High-risk action: {}", inputs.action));
        }
        if inputs.integrity_score > 0.0 {
            risk_factors.push("Tampering detected".to_string());
        }
        if inputs.classification_score >= 0.6 {
            risk_factors.push(format!("Sensitive document (score: {:.2})", inputs.classification_score));
        }
        if inputs.is_after_hours || inputs.is_weekend {
            risk_factors.push("Off-hours activity".to_string());
        }

        // Primary factor: argmax over the raw (unweighted) component scores,
        // "none" unless one exceeds 0.5.
        let candidates = [
            ("Anomalous behavior", inputs.behavior_score),
            ("Sensitive document classification", inputs.classification_score),
            ("Document integrity concern", inputs.integrity_score),
        ];
        let primary_risk_factor = candidates
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .filter(|(_, value)| *value > 0.5)
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| "none".to_string());

        let requires_alert = self.should_alert(level, &risk_factors, inputs, base_action_mult, score);

        let mut components = HashMap::new();
        components.insert("behavior".to_string(), inputs.behavior_score);
        components.insert("classification".to_string(), inputs.classification_score);
        components.insert("integrity".to_string(), inputs.integrity_score);

        RiskAssessment {
            score,
            level,
            primary_risk_factor,
            risk_factors,
            requires_alert,
            components,
        }
    }

    /// Alert decision: true if level is critical; or high
    /// with at least 2 risk factors; or any integrity concern; or a
    /// cross-department access on a sensitive document with a significant
    /// action multiplier; or the fused score has reached the medium
    /// threshold at all (which subsumes high/critical, but is stated
    /// explicitly since those can theoretically be reached via the
    /// cross-department floor without tripping the other conditions).
    fn should_alert(&self, level: RiskLevel, risk_factors: &[String], inputs: RiskInputs, base_action_mult: f64, score: f64) -> bool {
        if level == RiskLevel::Critical {
            return true;
        }
        if level == RiskLevel::High && risk_factors.len() >= 2 {
            return true;
        }
        if inputs.integrity_score > 0.0 {
            return true;
        }
        if inputs.is_cross_department && inputs.classification_score > 0.7 && base_action_mult >= 1.5 {
            return true;
        }
        score >= crate::config::defaults::RISK_THRESHOLD_MEDIUM
    }

    /// `"[LEVEL] User {id} performed {action} on {doc} (Risk: {score:.2}) |
    /// Factors: {...}"`. Lists at most the top 3 risk factors.
    pub fn generate_alert_summary(
        assessment: &RiskAssessment,
        actor_id: &str,
        action: Action,
        document_id: &str,
    ) -> String {
        let level_str = assessment.level.as_str().to_uppercase();
        let factors = if assessment.risk_factors.is_empty() {
            "none".to_string()
        } else {
            assessment.risk_factors.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
        };
        format!(
            "[{level_str}] User {actor_id} performed {action} on {document_id} (Risk: {:.2}) | Factors: {factors}",
            assessment.score
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RiskFusionEngine {
        RiskFusionEngine::new(RiskWeights::default())
    }

    #[test]
    fn benign_same_department_view_is_low_risk() {
        let assessment = engine().compute_risk(RiskInputs {
            behavior_score: 0.1,
            classification_score: 0.2,
            integrity_score: 0.0,
            action: Action::View,
            is_cross_department: false,
            is_after_hours: false,
            is_weekend: false,
        });
        assert_eq!(assessment.level, RiskLevel::Low);
        assert!(!assessment.requires_alert);
    }

    #[test]
    fn cross_department_modify_of_confidential_is_escalated() {
        let assessment = engine().compute_risk(RiskInputs {
            behavior_score: 0.7,
            classification_score: 0.9,
            integrity_score: 0.0,
            action: Action::Modify,
            is_cross_department: true,
            is_after_hours: false,
            is_weekend: false,
        });
        assert!(matches!(assessment.level, RiskLevel::High | RiskLevel::Critical));
        assert!(assessment.requires_alert);
        assert!(assessment.risk_factors.iter().any(|f| f.contains("Cross-department")));
    }

    #[test]
    fn any_integrity_concern_forces_alert() {
        let assessment = engine().compute_risk(RiskInputs {
            behavior_score: 0.1,
            classification_score: 0.1,
            integrity_score: 0.3,
            action: Action::View,
            is_cross_department: false,
            is_after_hours: false,
            is_weekend: false,
        });
        assert!(assessment.requires_alert);
    }

    #[test]
    fn cross_department_floor_applies_even_with_low_base() {
        let assessment = engine().compute_risk(RiskInputs {
            behavior_score: 0.0,
            classification_score: 0.0,
            integrity_score: 0.0,
            action: Action::Delete,
            is_cross_department: true,
            is_after_hours: false,
            is_weekend: false,
        });
        // floor 0.55 * cross-dept delete multiplier 3.5, clamped to 1.0
        assert!((assessment.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cross_department_upload_is_not_labeled_high_risk_action() {
        // Upload's base multiplier (1.4) stays below the 1.5 high-risk-action
        // threshold even though its cross-department multiplier (1.5) clears it.
        let assessment = engine().compute_risk(RiskInputs {
            behavior_score: 0.1,
            classification_score: 0.1,
            integrity_score: 0.0,
            action: Action::Upload,
            is_cross_department: true,
            is_after_hours: false,
            is_weekend: false,
        });
        assert!(!assessment.risk_factors.iter().any(|f| f.contains("High-risk action")));
    }

    #[test]
    fn alert_summary_lists_at_most_top_three_factors() {
        let assessment = engine().compute_risk(RiskInputs {
            behavior_score: 0.9,
            classification_score: 0.9,
            integrity_score: 0.9,
            action: Action::Delete,
            is_cross_department: true,
            is_after_hours: true,
            is_weekend: false,
        });
        assert!(assessment.risk_factors.len() > 3);
        let summary = RiskFusionEngine::generate_alert_summary(&assessment, "u1", Action::Delete, "doc-1");
        let factors_listed = summary.split("Factors: ").nth(1).unwrap().split(", ").count();
        assert_eq!(factors_listed, 3);
    }

    #[test]
    fn alert_summary_format() {
        let assessment = engine().compute_risk(RiskInputs {
            behavior_score: 0.9,
            classification_score: 0.9,
            integrity_score: 0.9,
            action: Action::Delete,
            is_cross_department: true,
            is_after_hours: true,
            is_weekend: false,
        });
        let summary = RiskFusionEngine::generate_alert_summary(&assessment, "u1", Action::Delete, "doc-1");
        assert!(summary.starts_with("[CRITICAL] User u1 performed delete on doc-1"));
    }
}
