//! User roles carried in access tokens

use serde::{Deserialize, Serialize};

/// Role of an authenticated back-office user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Staff,
    Admin,
    Superadmin,
}

impl UserRole {
    /// Roles allowed to read stock reports
    pub fn can_view_stock(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Superadmin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::User => write!(f, "USER"),
            UserRole::Staff => write!(f, "STAFF"),
            UserRole::Admin => write!(f, "ADMIN"),
            UserRole::Superadmin => write!(f, "SUPERADMIN"),
        }
    }
}
