//! The authenticated subject of a permission check.

use super::permission::PermissionSet;
use super::role::Role;
use serde::{Deserialize, Serialize};

/// An authenticated user with exactly one role.
///
/// `overrides` are granted in addition to the role; there is no way to
/// revoke a role grant for a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub overrides: PermissionSet,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role,
            overrides: PermissionSet::new(),
        }
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: PermissionSet) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn is_super_admin(&self) -> bool {
        self.role.is_super_admin()
    }

    /// Role grants merged with overrides.
    pub fn effective_permissions(&self) -> PermissionSet {
        let mut all = self.role.permissions.clone();
        all.merge(&self.overrides);
        all
    }
}

/// Normalize an email for directory matching.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
