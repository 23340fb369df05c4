//! Document integrity / tamper detection.
//!
//! SHA-256 content hashing establishes whether content changed at all;
//! severity beyond that is either driven by an optional semantic-similarity
//! model or, absent one, a size-delta heuristic.

use sha2::{Digest, Sha256};

use crate::types::enums::TamperSeverity;

/// Result of one integrity check.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityResult {
    pub current_hash: String,
    pub hash_match: bool,
    pub is_tampered: bool,
    pub severity: TamperSeverity,
    pub similarity: Option<f64>,
}

impl IntegrityResult {
    /// Neutral result for actions that don't touch content.
    pub fn neutral() -> Self {
        Self {
            current_hash: String::new(),
            hash_match: true,
            is_tampered: false,
            severity: TamperSeverity::None,
            similarity: None,
        }
    }
}

/// Optional pluggable semantic-similarity tier.
pub trait SemanticSimilarityModel: Send + Sync {
    /// Cosine similarity in `[0, 1]` between two content snapshots, or `None`
    /// if the model can't score this pair.
    fn similarity(&self, original: &str, modified: &str) -> Option<f64>;
}

#[derive(Default)]
pub struct IntegrityVerifier {
    semantic_model: Option<Box<dyn SemanticSimilarityModel>>,
}

impl IntegrityVerifier {
    pub fn new() -> Self {
        Self { semantic_model: None }
    }

    pub fn with_semantic_model(model: Box<dyn SemanticSimilarityModel>) -> Self {
        Self { semantic_model: Some(model) }
    }

    pub fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Severity thresholds on similarity: `>=0.95` minor, `>=0.85` moderate, else major.
    fn severity_from_similarity(similarity: f64) -> TamperSeverity {
        if similarity >= 0.95 {
            TamperSeverity::Minor
        } else if similarity >= 0.85 {
            TamperSeverity::Moderate
        } else {
            TamperSeverity::Major
        }
    }

    /// Fallback severity when no semantic model is configured: a coarse
    /// size-delta heuristic.
    fn severity_from_size_delta(original: &str, modified: &str) -> TamperSeverity {
        let original_len = original.len().max(1) as f64;
        let delta = (modified.len() as f64 - original.len() as f64).abs() / original_len;
        if delta < 0.05 {
            TamperSeverity::Minor
        } else if delta < 0.20 {
            TamperSeverity::Moderate
        } else {
            TamperSeverity::Major
        }
    }

    pub fn check(&self, baseline_hash: &str, original: &str, modified: &str) -> IntegrityResult {
        let current_hash = Self::compute_hash(modified);
        let hash_match = current_hash == baseline_hash;

        if hash_match {
            return IntegrityResult {
                current_hash,
                hash_match: true,
                is_tampered: false,
                severity: TamperSeverity::None,
                similarity: Some(1.0),
            };
        }

        match self.semantic_model.as_ref().and_then(|m| m.similarity(original, modified)) {
            Some(similarity) => IntegrityResult {
                current_hash,
                hash_match: false,
                is_tampered: true,
                severity: Self::severity_from_similarity(similarity),
                similarity: Some(similarity),
            },
            None => IntegrityResult {
                current_hash,
                hash_match: false,
                is_tampered: true,
                severity: Self::severity_from_size_delta(original, modified),
                similarity: None,
            },
        }
    }

    /// Tamper check when the baseline content itself wasn't retained, only
    /// its hash. Tampering is still detectable from the hash mismatch alone,
    /// but with nothing to diff against, severity can't be more specific than
    /// `Unknown`.
    pub fn check_hash_only(&self, baseline_hash: &str, modified: &str) -> IntegrityResult {
        let current_hash = Self::compute_hash(modified);
        let hash_match = current_hash == baseline_hash;

        if hash_match {
            return IntegrityResult {
                current_hash,
                hash_match: true,
                is_tampered: false,
                severity: TamperSeverity::None,
                similarity: None,
            };
        }

        IntegrityResult {
            current_hash,
            hash_match: false,
            is_tampered: true,
            severity: TamperSeverity::Unknown,
            similarity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_hash_matches() {
        let verifier = IntegrityVerifier::new();
        let hash = IntegrityVerifier::compute_hash("hello world");
        let result = verifier.check(&hash, "hello world", "hello world");
        assert!(result.hash_match);
        assert!(!result.is_tampered);
        assert_eq!(result.severity, TamperSeverity::None);
    }

    #[test]
    fn small_size_delta_is_minor_without_semantic_model() {
        let verifier = IntegrityVerifier::new();
        let hash = IntegrityVerifier::compute_hash("a".repeat(1000).as_str());
        let modified = "a".repeat(1010);
        let result = verifier.check(&hash, &"a".repeat(1000), &modified);
        assert!(result.is_tampered);
        assert_eq!(result.severity, TamperSeverity::Minor);
    }

    #[test]
    fn large_size_delta_is_major_without_semantic_model() {
        let verifier = IntegrityVerifier::new();
        let original = "a".repeat(1000);
        let hash = IntegrityVerifier::compute_hash(&original);
        let modified = "a".repeat(100);
        let result = verifier.check(&hash, &original, &modified);
        assert_eq!(result.severity, TamperSeverity::Major);
    }

    struct FixedSimilarity(f64);
    impl SemanticSimilarityModel for FixedSimilarity {
        fn similarity(&self, _original: &str, _modified: &str) -> Option<f64> {
            Some(self.0)
        }
    }

    #[test]
    fn semantic_model_drives_severity_when_configured() {
        let verifier = IntegrityVerifier::with_semantic_model(Box::new(FixedSimilarity(0.9)));
        let hash = IntegrityVerifier::compute_hash("original content");
        let result = verifier.check(&hash, "original content", "slightly different content");
        assert_eq!(result.severity, TamperSeverity::Moderate);
        assert_eq!(result.similarity, Some(0.9));
    }

    #[test]
    fn hash_only_mismatch_is_unknown_severity() {
        let verifier = IntegrityVerifier::new();
        let hash = IntegrityVerifier::compute_hash("original content");
        let result = verifier.check_hash_only(&hash, "tampered content");
        assert!(result.is_tampered);
        assert_eq!(result.severity, TamperSeverity::Unknown);
    }

    #[test]
    fn hash_only_match_is_untampered() {
        let verifier = IntegrityVerifier::new();
        let hash = IntegrityVerifier::compute_hash("original content");
        let result = verifier.check_hash_only(&hash, "original content");
        assert!(!result.is_tampered);
        assert_eq!(result.severity, TamperSeverity::None);
    }
}
