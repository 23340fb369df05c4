use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::enums::{AlertStatus, RiskLevel};

/// A surfaced alert. `details` stays a free-form map because its contents
/// are opaque to the core — the worker stuffs in whatever risk-breakdown
/// fields it has, and analysts are free to read them, but nothing
/// downstream depends on its shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    pub event_id: String,
    pub actor_id: String,
    pub priority: RiskLevel,
    pub risk_score: f64,
    pub summary: String,
    pub details: HashMap<String, Value>,
    pub status: AlertStatus,
    pub assigned_to: Option<String>,
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}
