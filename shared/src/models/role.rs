//! Role Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role
///
/// Stored as lowercase text in `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Agency customer submitting work requests
    Client,
    /// Agency staff
    Admin,
    /// Agency staff with visibility over every admin's activity
    Superadmin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "client" => Some(Role::Client),
            "admin" => Some(Role::Admin),
            "superadmin" => Some(Role::Superadmin),
            _ => None,
        }
    }

    /// Admin or superadmin
    pub const fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }

    pub const fn is_superadmin(&self) -> bool {
        matches!(self, Role::Superadmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored role string is not one of the known roles
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::from_db(&value).ok_or(UnknownRole(value))
    }
}
