//! Fixed-set enumerations shared across the data model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Actor role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Analyst,
    Admin,
}

/// Department tag. Comparisons across the pipeline are case-insensitive, so
/// department identity is normalized to lowercase at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Department(String);

impl Department {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document/actor-action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Download,
    Upload,
    Modify,
    Delete,
    Share,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Download => "download",
            Action::Upload => "upload",
            Action::Modify => "modify",
            Action::Delete => "delete",
            Action::Share => "share",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "view" => Some(Action::View),
            "download" => Some(Action::Download),
            "upload" => Some(Action::Upload),
            "modify" => Some(Action::Modify),
            "delete" => Some(Action::Delete),
            "share" => Some(Action::Share),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Document sensitivity level. Ordered by hierarchy:
/// `Public < Internal < Confidential` — used for the upload mismatch check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    Public,
    Internal,
    Confidential,
}

impl Sensitivity {
    /// Hierarchy rank used by the mismatch check.
    pub fn rank(self) -> u8 {
        match self {
            Sensitivity::Public => 1,
            Sensitivity::Internal => 2,
            Sensitivity::Confidential => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sensitivity::Public => "public",
            Sensitivity::Internal => "internal",
            Sensitivity::Confidential => "confidential",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "public" => Some(Sensitivity::Public),
            "internal" => Some(Sensitivity::Internal),
            "confidential" => Some(Sensitivity::Confidential),
            _ => None,
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Qualitative magnitude of integrity drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TamperSeverity {
    None,
    Minor,
    Moderate,
    Major,
    Unknown,
}

impl TamperSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            TamperSeverity::None => "none",
            TamperSeverity::Minor => "minor",
            TamperSeverity::Moderate => "moderate",
            TamperSeverity::Major => "major",
            TamperSeverity::Unknown => "unknown",
        }
    }

    /// Risk score mapping per severity level.
    pub fn risk_score(self) -> f64 {
        match self {
            TamperSeverity::None => 0.0,
            TamperSeverity::Minor => 0.3,
            TamperSeverity::Moderate => 0.6,
            TamperSeverity::Major => 0.9,
            TamperSeverity::Unknown => 0.7,
        }
    }
}

impl fmt::Display for TamperSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall risk level bucket. Thresholds are inclusive on the lower bound
/// everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        use crate::config::defaults::{
            RISK_THRESHOLD_CRITICAL, RISK_THRESHOLD_HIGH, RISK_THRESHOLD_MEDIUM,
        };
        if score >= RISK_THRESHOLD_CRITICAL {
            RiskLevel::Critical
        } else if score >= RISK_THRESHOLD_HIGH {
            RiskLevel::High
        } else if score >= RISK_THRESHOLD_MEDIUM {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alert lifecycle state. Transition graph:
/// `open -> investigating -> {resolved, dismissed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    Investigating,
    Resolved,
    Dismissed,
}

impl AlertStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Open => "open",
            AlertStatus::Investigating => "investigating",
            AlertStatus::Resolved => "resolved",
            AlertStatus::Dismissed => "dismissed",
        }
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: AlertStatus) -> bool {
        matches!(
            (self, next),
            (AlertStatus::Open, AlertStatus::Investigating)
                | (AlertStatus::Open, AlertStatus::Resolved)
                | (AlertStatus::Open, AlertStatus::Dismissed)
                | (AlertStatus::Investigating, AlertStatus::Resolved)
                | (AlertStatus::Investigating, AlertStatus::Dismissed)
        )
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Explanation artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationType {
    BehaviorShap,
    DocumentLime,
}

impl ExplanationType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExplanationType::BehaviorShap => "behavior_shap",
            ExplanationType::DocumentLime => "document_lime",
        }
    }
}

impl fmt::Display for ExplanationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
