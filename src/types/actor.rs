use serde::{Deserialize, Serialize};

use super::enums::{Department, Role};

/// A person the system observes. `actor_id` is opaque and
/// immutable once assigned — the store treats it as a primary key, never a
/// value to be recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub actor_id: String,
    pub username: String,
    pub department: Department,
    pub role: Role,
    pub active: bool,
}

impl Actor {
    pub fn new(actor_id: impl Into<String>, username: impl Into<String>, department: Department, role: Role) -> Self {
        Self {
            actor_id: actor_id.into(),
            username: username.into(),
            department,
            role,
            active: true,
        }
    }
}
