use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Action, Department, RiskLevel};

/// A single observed document-access event. Events are
/// append-only once persisted — the store layer enforces that, not this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub actor_id: String,
    pub actor_department: Department,
    pub action: Action,
    pub document_id: Option<String>,
    pub target_department: Option<Department>,
    pub timestamp: DateTime<Utc>,
    pub bytes_transferred: u64,
    pub source_ip: Option<String>,
    pub device_info: Option<String>,
    pub session_id: Option<String>,
    pub is_cross_department: bool,
    pub behavior_score: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

impl Event {
    pub fn is_after_hours(&self) -> bool {
        let hour = self.timestamp.format("%H").to_string().parse::<u32>().unwrap_or(0);
        !(8..=18).contains(&hour)
    }

    pub fn is_weekend(&self) -> bool {
        use chrono::Datelike;
        self.timestamp.weekday().num_days_from_monday() >= 5
    }
}
