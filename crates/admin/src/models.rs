//! Admin-side records read from the hosted backend.

use bw_core::{ProfileId, Role};
use serde::{Deserialize, Serialize};

/// A signed-in user as reported by the hosted auth service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: ProfileId,
    #[serde(default)]
    pub email: Option<String>,
}

/// A `profiles` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl Profile {
    /// Profile for an authenticated user with no `profiles` row yet.
    #[must_use]
    pub fn for_user(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: None,
            role: Role::User,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
