//! HTTP handlers for the ingest/queue-status/refresh surface.
//!
//! Listing, searching, or assigning alerts is explicitly out of scope —
//! those are external collaborators reading the store directly. This
//! module only covers what actually sits in front of the queue and the
//! token lifecycle.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::auth::{self, check_department_access, verify_access_token};
use crate::error::AppError;
use crate::pipeline::coordinator::{IncomingAccess, QueuedAccess};
use crate::types::enums::{Action, Department, Sensitivity};

/// Ingest request body.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub document_id: Option<String>,
    pub document_name: Option<String>,
    pub target_department: String,
    pub action: String,
    pub bytes_transferred: u64,
    pub source_ip: Option<String>,
    pub device_info: Option<String>,
    pub session_id: Option<String>,
    pub content: Option<String>,
    pub declared_sensitivity: Option<String>,
}

/// Stub response returned synchronously on admission: canonical
/// scored values are only available once the worker has processed the event.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub event_id: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub risk_score: f64,
    pub risk_level: String,
    pub severity: String,
    pub requires_alert: bool,
    pub warning_message: Option<String>,
    pub behavior_score: f64,
    pub sensitivity_score: f64,
    pub integrity_score: f64,
    pub is_cross_department: bool,
    pub is_anomalous: bool,
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Authentication("missing bearer token".into()))
}

/// `POST /events/ingest`.
///
/// Authenticates, computes cross-department synchronously, attempts a
/// non-blocking enqueue, and returns a pending stub — no database writes, no
/// alert creation, no broadcast happen here; those are entirely the worker's
/// job.
pub async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, AppError> {
    let identity = verify_access_token(bearer_token(&headers)?)?;

    let action = Action::parse(&req.action)
        .ok_or_else(|| AppError::Validation(format!("unknown action: {}", req.action)))?;
    let target_department = Department::new(&req.target_department);
    let declared_sensitivity = req
        .declared_sensitivity
        .as_deref()
        .map(|s| Sensitivity::parse(s).ok_or_else(|| AppError::Validation(format!("unknown sensitivity: {s}"))))
        .transpose()?;

    if matches!(action, Action::Modify | Action::Upload) && req.content.is_none() {
        return Err(AppError::Validation("modify/upload requires content".into()));
    }

    let baseline = match &req.document_id {
        Some(document_id) => state
            .store
            .get_document(document_id)
            .await
            .map_err(|e| AppError::Downstream(e.to_string()))?,
        None => None,
    };

    let access_check = check_department_access(&identity.department, &target_department, action);

    let event_id = uuid::Uuid::new_v4().simple().to_string();
    let timestamp = Utc::now();

    let access = IncomingAccess {
        actor_id: identity.actor_id.clone(),
        actor_department: identity.department.clone(),
        action,
        document_id: req.document_id.clone(),
        target_department: target_department.clone(),
        bytes_transferred: req.bytes_transferred,
        source_ip: req.source_ip,
        device_info: req.device_info,
        session_id: req.session_id,
        baseline_hash: baseline.as_ref().map(|d| d.baseline_hash.clone()),
        baseline_content: baseline.and_then(|d| d.baseline_content),
        content: req.content,
        declared_sensitivity,
    };

    let queued = QueuedAccess {
        event_id: event_id.clone(),
        timestamp,
        access,
    };

    if state.queue.is_near_capacity() || state.queue.try_offer(queued).is_err() {
        return Err(AppError::Admission);
    }

    let warning_message = access_check
        .is_cross_department
        .then(|| format!("cross-department {action} — final risk verdict pending"));

    Ok(Json(IngestResponse {
        event_id,
        timestamp,
        risk_score: 0.0,
        risk_level: "pending".to_string(),
        severity: "pending".to_string(),
        requires_alert: false,
        warning_message,
        behavior_score: 0.0,
        sensitivity_score: 0.0,
        integrity_score: 0.0,
        is_cross_department: access_check.is_cross_department,
        is_anomalous: false,
    }))
}

/// `GET /events/queue/status`.
pub async fn queue_status(State(state): State<AppState>) -> Json<crate::queue::QueueStats> {
    Json(state.queue.stats())
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// Exchanges a refresh token for a new access token with identical claims
/// and a fresh expiry.
pub async fn refresh(Json(req): Json<RefreshRequest>) -> Result<Json<RefreshResponse>, AppError> {
    let claims = auth::verify_refresh_token(&req.refresh_token)?;
    let department = Department::new(&claims.department);
    let access_token = auth::create_access_token(&claims.actor_id, &claims.username, claims.role, &department)?;
    Ok(Json(RefreshResponse {
        access_token,
        token_type: "bearer",
    }))
}
