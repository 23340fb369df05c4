//! Explanation generation.
//!
//! Behavior attribution is a SHAP-style linear proxy: each feature's
//! contribution is its deviation from a trained mean, scaled by a trained
//! per-feature importance weight. Document attribution is a simplified LIME:
//! leave-one-word-out perturbation against the keyword classifier's
//! confidence.

use std::collections::HashMap;

use crate::config::defaults::{EXPLANATION_TOP_K, LIME_PERTURBATIONS};
use crate::pipeline::behavior::{BehaviorFeatures, FEATURE_NAMES};
use crate::pipeline::sensitivity::SensitivityClassifier;

/// Per-feature mean/importance learned alongside the behavior detector.
/// Deviation-from-mean, scaled by a learned importance weight, stands in
/// for SHAP values when no real SHAP library is available.
#[derive(Debug, Clone)]
pub struct BehaviorExplainerModel {
    means: HashMap<&'static str, f64>,
    importances: HashMap<&'static str, f64>,
}

impl BehaviorExplainerModel {
    /// Fit means/importances from a training batch: the importance of a
    /// feature is its population standard deviation, since a feature that
    /// varies more carries more discriminating signal for this proxy.
    pub fn fit(training_data: &[BehaviorFeatures]) -> Self {
        let mut means = HashMap::new();
        let mut importances = HashMap::new();

        if training_data.is_empty() {
            for name in FEATURE_NAMES {
                means.insert(name, 0.0);
                importances.insert(name, 1.0);
            }
            return Self { means, importances };
        }

        let rows: Vec<Vec<f64>> = training_data.iter().map(|f| f.to_vec()).collect();
        let n = rows.len() as f64;

        for (idx, name) in FEATURE_NAMES.iter().enumerate() {
            let mean = rows.iter().map(|r| r[idx]).sum::<f64>() / n;
            let variance = rows.iter().map(|r| (r[idx] - mean).powi(2)).sum::<f64>() / n;
            means.insert(name, mean);
            importances.insert(name, variance.sqrt().max(1e-6));
        }

        Self { means, importances }
    }

    /// SHAP-style attribution: `(value - mean) * importance` per feature,
    /// kept to the top-K by absolute magnitude.
    pub fn explain(&self, features: BehaviorFeatures) -> (f64, HashMap<String, f64>) {
        let values = features.to_vec();
        let mut attributions: Vec<(String, f64)> = FEATURE_NAMES
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let mean = *self.means.get(name).unwrap_or(&0.0);
                let importance = *self.importances.get(name).unwrap_or(&1.0);
                (name.to_string(), (values[idx] - mean) * importance)
            })
            .collect();

        attributions.sort_by(|a, b| b.1.abs().partial_cmp(&a.1.abs()).unwrap_or(std::cmp::Ordering::Equal));
        attributions.truncate(EXPLANATION_TOP_K);

        let baseline: f64 = self.means.values().sum::<f64>() / self.means.len().max(1) as f64;
        (baseline, attributions.into_iter().collect())
    }
}

/// Word-level attribution for document content. Not a true
/// LIME implementation — there's no local surrogate model being fit — but it
/// follows the same leave-one-out perturbation idea: drop each word and
/// measure how much the classifier's confidence shifts.
pub struct DocumentExplainer;

impl DocumentExplainer {
    /// Perturb up to `LIME_PERTURBATIONS` words, return attributions sorted
    /// by absolute influence, most influential first.
    pub fn explain(content: &str) -> Vec<(String, f64)> {
        let baseline = SensitivityClassifier::classify_by_keywords(content);
        let words: Vec<&str> = content.split_whitespace().collect();

        let mut attributions: Vec<(String, f64)> = words
            .iter()
            .enumerate()
            .take(LIME_PERTURBATIONS)
            .map(|(idx, word)| {
                let without_word: String = words
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != idx)
                    .map(|(_, w)| *w)
                    .collect::<Vec<_>>()
                    .join(" ");
                let perturbed = SensitivityClassifier::classify_by_keywords(&without_word);
                let influence = if perturbed.predicted == baseline.predicted {
                    baseline.confidence - perturbed.confidence
                } else {
                    baseline.confidence
                };
                (word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase(), influence)
            })
            .filter(|(word, _)| !word.is_empty())
            .collect();

        attributions.sort_by(|a, b| b.1.abs().partial_cmp(&a.1.abs()).unwrap_or(std::cmp::Ordering::Equal));
        attributions
    }
}
