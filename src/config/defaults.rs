//! System-wide default constants.
//!
//! Centralises magic numbers so each subsystem reads its thresholds from
//! one place.

// ============================================================================
// Queue
// ============================================================================

/// Default bounded queue capacity.
pub const QUEUE_CAPACITY: usize = 1000;

/// Utilization fraction above which ingestion sheds new admissions.
pub const QUEUE_NEAR_CAPACITY_RATIO: f64 = 0.9;

// ============================================================================
// Behavior scorer
// ============================================================================

/// Width of the per-actor sliding window.
pub const BEHAVIOR_WINDOW_HOURS: i64 = 24;

/// Number of features in the fixed-order behavior feature vector.
pub const FEATURE_COUNT: usize = 16;

/// Default contamination rate for the anomaly detector.
pub const ANOMALY_CONTAMINATION: f64 = 0.1;

/// Default number of isolation trees.
pub const ISOLATION_FOREST_TREES: usize = 100;

/// Default random seed for reproducible training.
pub const ISOLATION_FOREST_SEED: u64 = 42;

/// Subsample size drawn per isolation tree.
pub const ISOLATION_FOREST_SUBSAMPLE_SIZE: usize = 256;

// ============================================================================
// Risk fusion
// ============================================================================

pub const DEFAULT_BEHAVIOR_WEIGHT: f64 = 0.4;
pub const DEFAULT_CLASSIFICATION_WEIGHT: f64 = 0.3;
pub const DEFAULT_INTEGRITY_WEIGHT: f64 = 0.3;

pub const RISK_THRESHOLD_CRITICAL: f64 = 0.8;
pub const RISK_THRESHOLD_HIGH: f64 = 0.6;
pub const RISK_THRESHOLD_MEDIUM: f64 = 0.4;

// ============================================================================
// Explanation engine
// ============================================================================

/// Default number of top behavior-attribution features to keep.
pub const EXPLANATION_TOP_K: usize = 10;

/// Default number of perturbations for the document token explainer.
pub const LIME_PERTURBATIONS: usize = 500;

// ============================================================================
// Auth
// ============================================================================

pub const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;
pub const REFRESH_TOKEN_EXPIRE_DAYS: i64 = 7;
