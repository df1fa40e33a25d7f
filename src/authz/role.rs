//! Roles and their permission grants.
//!
//! The journal ships five system roles. Custom roles are created with the
//! [`RoleBuilder`]:
//!
//! ```rust
//! use journal_authz::authz::{PermissionCheck, PermissionKey, RoleBuilder};
//!
//! let reviewer = RoleBuilder::new("Reviewer")
//!     .description("Reads submissions and comments on them")
//!     .with_key("article.READ")
//!     .with_key("notification.READ")
//!     .build()
//!     .unwrap();
//!
//! let read: PermissionKey = "article.READ".parse().unwrap();
//! let delete: PermissionKey = "article.DELETE".parse().unwrap();
//! assert!(reviewer.has_permission(&read));
//! assert!(!reviewer.has_permission(&delete));
//! assert!(!reviewer.is_system);
//! ```

use super::permission::{PermissionKey, PermissionSet, ACTIONS, ADMIN_RESOURCES, RESOURCES};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Distinguished role that passes every check.
pub const SUPER_ADMIN: &str = "Super Admin";
pub const ADMIN: &str = "Admin";
pub const EDITOR: &str = "Editor";
pub const AUTHOR: &str = "Author";
pub const VIEWER: &str = "Viewer";

/// A named bundle of permission keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// System roles cannot be deleted.
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub permissions: PermissionSet,
}

impl Role {
    /// Whether this role is the distinguished super-admin role.
    pub fn is_super_admin(&self) -> bool {
        self.name == SUPER_ADMIN
    }

    /// Stable id used for the built-in roles (`role-super-admin`).
    pub fn system_id(name: &str) -> String {
        format!("role-{}", name.to_lowercase().replace(' ', "-"))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Builder for roles.
#[derive(Debug)]
pub struct RoleBuilder {
    id: Option<String>,
    name: String,
    description: Option<String>,
    is_system: bool,
    permissions: PermissionSet,
    raw_keys: Vec<String>,
}

impl RoleBuilder {
    /// Create a new role builder with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            is_system: false,
            permissions: PermissionSet::new(),
            raw_keys: Vec::new(),
        }
    }

    /// Use a fixed id instead of a generated one.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Mark the role as a system role.
    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    pub fn with_permission(mut self, key: PermissionKey) -> Self {
        self.permissions.add(key);
        self
    }

    pub fn with_permissions<I: IntoIterator<Item = PermissionKey>>(mut self, keys: I) -> Self {
        for key in keys {
            self.permissions.add(key);
        }
        self
    }

    /// Add a key by its string form; validated in [`RoleBuilder::build`].
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.raw_keys.push(key.into());
        self
    }

    /// Build the role.
    ///
    /// # Errors
    ///
    /// Returns an error if any key passed to [`RoleBuilder::with_key`] is
    /// malformed.
    pub fn build(self) -> Result<Role> {
        let mut permissions = self.permissions;
        permissions.merge(&PermissionSet::parse_all(&self.raw_keys)?);
        Ok(Role {
            id: self
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: self.name,
            description: self.description,
            is_system: self.is_system,
            permissions,
        })
    }
}

/// Trait for checking plain grants, without ownership or catalog rules.
///
/// Use [`PermissionChecker`](super::PermissionChecker) for authorization
/// decisions; this trait only answers "is the key in the set".
pub trait PermissionCheck {
    fn has_permission(&self, key: &PermissionKey) -> bool;

    fn has_all_permissions<'a, I>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = &'a PermissionKey>,
    {
        keys.into_iter().all(|k| self.has_permission(k))
    }

    fn has_any_permission<'a, I>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = &'a PermissionKey>,
    {
        keys.into_iter().any(|k| self.has_permission(k))
    }
}

impl PermissionCheck for Role {
    fn has_permission(&self, key: &PermissionKey) -> bool {
        self.permissions.contains(key)
    }
}

impl PermissionCheck for PermissionSet {
    fn has_permission(&self, key: &PermissionKey) -> bool {
        self.contains(key)
    }
}

fn keys_where(filter: impl Fn(&str, &str) -> bool) -> PermissionSet {
    RESOURCES
        .iter()
        .flat_map(|r| ACTIONS.iter().map(move |a| (*r, *a)))
        .filter(|(r, a)| filter(r, a))
        .filter_map(|(r, a)| PermissionKey::new(r, a).ok())
        .collect()
}

/// The five system roles with their default grants.
pub fn default_roles() -> Vec<Role> {
    let system = |name: &str, description: &str, permissions: PermissionSet| Role {
        id: Role::system_id(name),
        name: name.to_string(),
        description: Some(description.to_string()),
        is_system: true,
        permissions,
    };

    vec![
        system(
            SUPER_ADMIN,
            "Unrestricted access, including role and permission management",
            keys_where(|_, _| true),
        ),
        system(
            ADMIN,
            "Manages content and users; cannot delete roles or permissions",
            keys_where(|r, a| !((r == "permission" || r == "role") && a == "DELETE")),
        ),
        system(
            EDITOR,
            "Manages journal content and reads the user list",
            keys_where(|r, a| !ADMIN_RESOURCES.contains(&r) || (r == "user" && a == "READ")),
        ),
        system(
            AUTHOR,
            "Submits articles and reads journal content",
            keys_where(|r, a| {
                matches!(
                    (r, a),
                    ("article", "CREATE")
                        | ("article", "READ")
                        | ("author", "READ")
                        | ("callforpapers", "READ")
                        | ("notification", "READ")
                )
            }),
        ),
        system(
            VIEWER,
            "Read-only access to journal content",
            keys_where(|r, a| a == "READ" && !ADMIN_RESOURCES.contains(&r)),
        ),
    ]
}
