//! Document sensitivity classification.
//!
//! Primary tier is whole-word lexicon matching; an optional zero-shot tier
//! can be plugged in ahead of it and silently falls back to the lexicon on
//! failure or absence, per Non-goals (no bundled ML model).

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::types::enums::Sensitivity;

/// Keyword lists per level.
fn keyword_table() -> &'static HashMap<Sensitivity, Vec<&'static str>> {
    static TABLE: OnceLock<HashMap<Sensitivity, Vec<&'static str>>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut m = HashMap::new();
        m.insert(Sensitivity::Public, vec!["public", "press release", "marketing", "announcement", "newsletter"]);
        m.insert(
            Sensitivity::Internal,
            vec!["internal", "employee", "policy", "procedure", "memo", "meeting notes", "draft"],
        );
        m.insert(
            Sensitivity::Confidential,
            vec![
                "confidential",
                "restricted",
                "secret",
                "private",
                "sensitive",
                "classified",
                "proprietary",
                "financial",
                "pii",
                "personal data",
                "gdpr",
                "ccpa",
                "unauthorized access",
                "c-level",
                "executive",
                "ssn",
                "social security",
                "credit card",
                "salary",
                "compensation",
                "merger",
                "acquisition",
                "trade secret",
                "nda",
                "legal privilege",
                "attorney-client",
                "medical",
                "health",
                "hipaa",
            ],
        );
        m
    })
}

fn word_boundary_regex(keyword: &str) -> Regex {
    Regex::new(&format!(r"\b{}\b", regex::escape(keyword))).expect("keyword regex is always valid")
}

/// Fixed bonus added to the confidential tally per matching pattern, mandatory
/// regardless of whether any lexicon keyword is present.
const SENSITIVE_PATTERN_BONUS: f64 = 0.25;

fn sensitive_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"\b\d{3}-\d{2}-\d{4}\b",                     // SSN-like
            r"\b(?:\d[ -]?){13,16}\b",                     // credit-card-like
            r"\b[A-Za-z0-9_-]{32,}\b",                     // api-key-like
            r"(?i)password\s*:\s*\S+",                     // "password:" lines
            r"\$\s?\d{1,3}(?:,\d{3})*(?:\.\d{2})?",        // money
            r"\b\d{1,3}(?:\.\d+)?\s?%",                    // percentages
        ]
        .iter()
        .map(|p| Regex::new(p).expect("sensitive pattern regex is always valid"))
        .collect()
    })
}

/// Classification result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    pub predicted: Sensitivity,
    pub confidence: f64,
    pub source: ClassificationSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    Keyword,
    ZeroShot,
    Default,
}

/// Optional pluggable zero-shot tier.
pub trait ZeroShotClassifier: Send + Sync {
    fn classify(&self, content: &str) -> Option<ClassificationResult>;
}

#[derive(Default)]
pub struct SensitivityClassifier {
    zero_shot: Option<Box<dyn ZeroShotClassifier>>,
}

impl SensitivityClassifier {
    pub fn new() -> Self {
        Self { zero_shot: None }
    }

    pub fn with_zero_shot(zero_shot: Box<dyn ZeroShotClassifier>) -> Self {
        Self { zero_shot: Some(zero_shot) }
    }

    /// Risk weight per level.
    pub fn risk_weight(level: Sensitivity) -> f64 {
        match level {
            Sensitivity::Public => 0.1,
            Sensitivity::Internal => 0.5,
            Sensitivity::Confidential => 0.9,
        }
    }

    pub fn risk_score(result: ClassificationResult) -> f64 {
        Self::risk_weight(result.predicted) * result.confidence
    }

    /// Classify document content. Tries the zero-shot tier first (if
    /// configured); on `None` (unconfigured or classification failure),
    /// falls back to keyword matching.
    pub fn classify(&self, content: &str) -> ClassificationResult {
        if let Some(zero_shot) = &self.zero_shot {
            if let Some(result) = zero_shot.classify(content) {
                return result;
            }
        }
        Self::classify_by_keywords(content)
    }

    /// Lexicon tier: whole-word keyword matching, plus a mandatory tally of
    /// regex patterns (SSN-like, credit-card-like, api-key-like, "password:"
    /// lines, money, percentages) that each add a fixed bonus straight to the
    /// confidential tally, independent of whether any keyword matched.
    /// Confidence is boosted further for confidential predictions.
    pub fn classify_by_keywords(content: &str) -> ClassificationResult {
        let mut tally: HashMap<Sensitivity, f64> = HashMap::new();
        for (&level, keywords) in keyword_table() {
            let count = keywords
                .iter()
                .filter(|kw| word_boundary_regex(kw).is_match(content))
                .count();
            tally.insert(level, count as f64);
        }

        let pattern_hits = sensitive_patterns().iter().filter(|re| re.is_match(content)).count();
        if pattern_hits > 0 {
            *tally.entry(Sensitivity::Confidential).or_insert(0.0) += pattern_hits as f64 * SENSITIVE_PATTERN_BONUS;
        }

        let total: f64 = tally.values().sum();
        if total <= 0.0 {
            return ClassificationResult {
                predicted: Sensitivity::Internal,
                confidence: 0.6,
                source: ClassificationSource::Default,
            };
        }

        let (&predicted, &count) =
            tally.iter().max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal)).expect("tally is non-empty");
        let mut confidence = count / total;

        if predicted == Sensitivity::Confidential && confidence < 0.6 {
            confidence = (confidence * 1.5).min(0.95);
        }

        ClassificationResult {
            predicted,
            confidence,
            source: ClassificationSource::Keyword,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_classification_when_no_keywords_match() {
        let result = SensitivityClassifier::classify_by_keywords("the quick brown fox jumps");
        assert_eq!(result.predicted, Sensitivity::Internal);
        assert_eq!(result.source, ClassificationSource::Default);
    }

    #[test]
    fn confidential_keyword_boosts_low_confidence() {
        let result = SensitivityClassifier::classify_by_keywords(
            "This memo contains confidential salary and compensation details alongside routine policy notes",
        );
        assert_eq!(result.predicted, Sensitivity::Confidential);
        assert!(result.confidence <= 0.95);
    }

    #[test]
    fn whole_word_matching_does_not_match_substrings() {
        // "classified" should not match inside "unclassified"
        let result = SensitivityClassifier::classify_by_keywords("this document is unclassified and public");
        assert_ne!(result.predicted, Sensitivity::Confidential);
    }

    #[test]
    fn ssn_pattern_alone_classifies_as_confidential() {
        let result = SensitivityClassifier::classify_by_keywords("routine update: SSN 123-45-6789, nothing else here");
        assert_eq!(result.predicted, Sensitivity::Confidential);
    }

    #[test]
    fn password_line_alone_classifies_as_confidential() {
        let result = SensitivityClassifier::classify_by_keywords("deployment notes\npassword: hunter2\nnothing else");
        assert_eq!(result.predicted, Sensitivity::Confidential);
    }

    #[test]
    fn risk_score_multiplies_weight_and_confidence() {
        let result = ClassificationResult {
            predicted: Sensitivity::Confidential,
            confidence: 0.8,
            source: ClassificationSource::Keyword,
        };
        let score = SensitivityClassifier::risk_score(result);
        assert!((score - 0.9 * 0.8).abs() < 1e-9);
    }
}
