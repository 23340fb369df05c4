//! JWT bearer authentication.
//!
//! Mirrors the service's `config` singleton pattern: tokens are signed and
//! verified against `config::get().jwt_secret`, never a value threaded
//! through call sites.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::enums::{Department, Role};

/// Claims embedded in both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub actor_id: String,
    pub username: String,
    pub role: Role,
    pub department: String,
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Identity resolved from a verified access token, used by handlers to check
/// department/role.
#[derive(Debug, Clone)]
pub struct Identity {
    pub actor_id: String,
    pub username: String,
    pub role: Role,
    pub department: Department,
}

impl From<Claims> for Identity {
    fn from(c: Claims) -> Self {
        Self {
            actor_id: c.actor_id,
            username: c.username,
            role: c.role,
            department: Department::new(c.department),
        }
    }
}

pub fn create_access_token(actor_id: &str, username: &str, role: Role, department: &Department) -> Result<String, AppError> {
    create_token(actor_id, username, role, department, TokenType::Access, Duration::minutes(crate::config::get().access_token_expire_minutes))
}

pub fn create_refresh_token(actor_id: &str, username: &str, role: Role, department: &Department) -> Result<String, AppError> {
    create_token(actor_id, username, role, department, TokenType::Refresh, Duration::days(crate::config::get().refresh_token_expire_days))
}

fn create_token(
    actor_id: &str,
    username: &str,
    role: Role,
    department: &Department,
    token_type: TokenType,
    ttl: Duration,
) -> Result<String, AppError> {
    let claims = Claims {
        actor_id: actor_id.to_string(),
        username: username.to_string(),
        role,
        department: department.as_str().to_string(),
        exp: (Utc::now() + ttl).timestamp(),
        token_type,
    };
    let secret = &crate::config::get().jwt_secret;
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::Authentication(format!("token signing failed: {e}")))
}

/// Decode and validate a bearer token, rejecting refresh tokens presented as
/// access tokens.
pub fn verify_access_token(token: &str) -> Result<Identity, AppError> {
    let secret = &crate::config::get().jwt_secret;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::Authentication(format!("invalid token: {e}")))?;

    if data.claims.token_type != TokenType::Access {
        return Err(AppError::Authentication("refresh token used where access token required".into()));
    }

    Ok(data.claims.into())
}

/// Decode and validate a refresh token, rejecting access tokens presented
/// where a refresh token is required.
pub fn verify_refresh_token(token: &str) -> Result<Claims, AppError> {
    let secret = &crate::config::get().jwt_secret;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::Authentication(format!("invalid token: {e}")))?;

    if data.claims.token_type != TokenType::Refresh {
        return Err(AppError::Authentication("access token used where refresh token required".into()));
    }

    Ok(data.claims)
}

/// Department-boundary check. Access is always allowed; the result flags
/// whether this is a cross-department access and the multiplier that should
/// feed risk fusion.
#[derive(Debug, Clone, Copy)]
pub struct DepartmentAccessCheck {
    pub is_cross_department: bool,
    pub risk_multiplier: f64,
}

pub fn check_department_access(actor_department: &Department, target_department: &Department, action: crate::types::enums::Action) -> DepartmentAccessCheck {
    use crate::types::enums::Action;

    let is_cross_department = actor_department != target_department;
    let risk_multiplier = if !is_cross_department {
        1.0
    } else if matches!(action, Action::Download | Action::Modify | Action::Delete) {
        2.0
    } else {
        1.5
    };

    DepartmentAccessCheck {
        is_cross_department,
        risk_multiplier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{self, Settings};

    fn ensure_config() {
        if !config::is_initialized() {
            config::init(Settings::from_env());
        }
    }

    #[test]
    fn access_token_round_trips() {
        ensure_config();
        let dept = Department::new("finance");
        let token = create_access_token("u1", "alice", Role::Analyst, &dept).unwrap();
        let identity = verify_access_token(&token).unwrap();
        assert_eq!(identity.actor_id, "u1");
        assert_eq!(identity.department, dept);
    }

    #[test]
    fn refresh_token_rejected_as_access() {
        ensure_config();
        let dept = Department::new("finance");
        let token = create_refresh_token("u1", "alice", Role::Analyst, &dept).unwrap();
        assert!(verify_access_token(&token).is_err());
    }

    #[test]
    fn refresh_token_round_trips_and_rejects_access_token() {
        ensure_config();
        let dept = Department::new("finance");
        let refresh = create_refresh_token("u1", "alice", Role::Analyst, &dept).unwrap();
        let claims = verify_refresh_token(&refresh).unwrap();
        assert_eq!(claims.actor_id, "u1");

        let access = create_access_token("u1", "alice", Role::Analyst, &dept).unwrap();
        assert!(verify_refresh_token(&access).is_err());
    }

    #[test]
    fn department_access_cross_dept_multiplier() {
        let hr = Department::new("hr");
        let finance = Department::new("finance");
        let check = check_department_access(&hr, &finance, crate::types::enums::Action::Download);
        assert!(check.is_cross_department);
        assert!((check.risk_multiplier - 2.0).abs() < 1e-9);

        let check_view = check_department_access(&hr, &finance, crate::types::enums::Action::View);
        assert!((check_view.risk_multiplier - 1.5).abs() < 1e-9);

        let check_same = check_department_access(&hr, &hr, crate::types::enums::Action::Delete);
        assert!(!check_same.is_cross_department);
        assert!((check_same.risk_multiplier - 1.0).abs() < 1e-9);
    }
}
