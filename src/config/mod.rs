//! Service configuration
//!
//! Provides process-wide settings loaded from environment variables, replacing hardcoded thresholds with operator-tunable values.
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(Settings::from_env());
//!
//! // Anywhere in the codebase:
//! let w = &config::get().risk_weights;
//! ```

pub mod defaults;

use std::env;
use std::sync::OnceLock;
use std::time::Duration;

/// Normalized risk-fusion weights. Always sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskWeights {
    pub behavior: f64,
    pub classification: f64,
    pub integrity: f64,
}

impl RiskWeights {
    pub fn new(behavior: f64, classification: f64, integrity: f64) -> Self {
        let total = behavior + classification + integrity;
        if total <= 0.0 {
            return Self {
                behavior: defaults::DEFAULT_BEHAVIOR_WEIGHT,
                classification: defaults::DEFAULT_CLASSIFICATION_WEIGHT,
                integrity: defaults::DEFAULT_INTEGRITY_WEIGHT,
            };
        }
        Self {
            behavior: behavior / total,
            classification: classification / total,
            integrity: integrity / total,
        }
    }
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self::new(
            defaults::DEFAULT_BEHAVIOR_WEIGHT,
            defaults::DEFAULT_CLASSIFICATION_WEIGHT,
            defaults::DEFAULT_INTEGRITY_WEIGHT,
        )
    }
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub risk_weights: RiskWeights,
    pub anomaly_contamination: f64,
    pub queue_capacity: usize,
    pub queue_near_capacity_ratio: f64,
    pub jwt_secret: String,
    pub store_path: String,
    pub shutdown_drain_timeout: Duration,
}

impl Settings {
    /// Load settings from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            access_token_expire_minutes: env_i64(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                defaults::ACCESS_TOKEN_EXPIRE_MINUTES,
            ),
            refresh_token_expire_days: env_i64(
                "REFRESH_TOKEN_EXPIRE_DAYS",
                defaults::REFRESH_TOKEN_EXPIRE_DAYS,
            ),
            risk_weights: RiskWeights::new(
                env_f64("RISK_BEHAVIOR_WEIGHT", defaults::DEFAULT_BEHAVIOR_WEIGHT),
                env_f64(
                    "RISK_CLASSIFICATION_WEIGHT",
                    defaults::DEFAULT_CLASSIFICATION_WEIGHT,
                ),
                env_f64("RISK_INTEGRITY_WEIGHT", defaults::DEFAULT_INTEGRITY_WEIGHT),
            ),
            anomaly_contamination: env_f64(
                "ANOMALY_CONTAMINATION",
                defaults::ANOMALY_CONTAMINATION,
            ),
            queue_capacity: env_usize("QUEUE_CAPACITY", defaults::QUEUE_CAPACITY),
            queue_near_capacity_ratio: defaults::QUEUE_NEAR_CAPACITY_RATIO,
            jwt_secret: env::var("SENTINEL_JWT_SECRET")
                .unwrap_or_else(|_| "dev-secret-change-me".to_string()),
            store_path: env::var("SENTINEL_STORE_PATH")
                .unwrap_or_else(|_| "sentinel-data".to_string()),
            shutdown_drain_timeout: Duration::from_secs(env_i64("SHUTDOWN_DRAIN_SECS", 10) as u64),
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Global settings, initialized once at startup.
static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Initialize the global settings.
///
/// Must be called exactly once before any calls to `get()`.
pub fn init(settings: Settings) {
    if SETTINGS.set(settings).is_err() {
        tracing::warn!("config::init() called more than once — ignoring");
    }
}

/// Get a reference to the global settings.
///
/// Panics if `init()` has not been called. This is by design — a missing
/// config is a fatal startup error, not a recoverable condition.
pub fn get() -> &'static Settings {
    SETTINGS
        .get()
        .expect("config::get() called before config::init() — this is a startup bug")
}

/// Check whether settings have been initialized. Useful for tests.
pub fn is_initialized() -> bool {
    SETTINGS.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_normalize() {
        let w = RiskWeights::new(4.0, 3.0, 3.0);
        assert!((w.behavior - 0.4).abs() < 1e-9);
        assert!((w.classification - 0.3).abs() < 1e-9);
        assert!((w.integrity - 0.3).abs() < 1e-9);
    }

    #[test]
    fn default_weights_sum_to_one() {
        let w = RiskWeights::default();
        assert!((w.behavior + w.classification + w.integrity - 1.0).abs() < 1e-9);
    }
}
