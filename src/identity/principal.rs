use serde::{Deserialize, Serialize};

/// Privilege marker attached to a successful login.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Leader,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Leader => "leader",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    /// Canonical name: the roster's spelling for leaders, the configured username for admin.
    pub name: String,
    pub role: Role,
}
