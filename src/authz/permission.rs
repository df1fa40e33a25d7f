//! Permission keys, permission sets and the permission catalog.
//!
//! A permission key names an action on a resource type, written
//! `<resource>.<ACTION>`:
//!
//! ```rust
//! use journal_authz::authz::PermissionKey;
//!
//! let key: PermissionKey = "article.UPDATE".parse().unwrap();
//! assert_eq!(key.resource(), "article");
//! assert_eq!(key.action(), "UPDATE");
//! assert_eq!(key.to_string(), "article.UPDATE");
//!
//! assert!("article".parse::<PermissionKey>().is_err());
//! assert!("Article.update".parse::<PermissionKey>().is_err());
//! ```

use crate::error::{AuthzError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Resources whose records exist in the journal CMS.
pub const RESOURCES: &[&str] = &[
    "article",
    "author",
    "callforpapers",
    "editorialboard",
    "notification",
    "permission",
    "role",
    "user",
];

/// Actions every resource supports.
pub const ACTIONS: &[&str] = &["CREATE", "READ", "UPDATE", "DELETE"];

/// Resources that manage access itself. Ownership never applies to them.
pub const ADMIN_RESOURCES: &[&str] = &["permission", "role", "user"];

/// A validated `<resource>.<ACTION>` permission key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey(String);

impl PermissionKey {
    /// Parse and validate a key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::MalformedPermissionKey`] when the key does not
    /// have exactly one dot, the resource is not lowercase alphanumeric, or
    /// the action is not uppercase.
    pub fn parse(raw: &str) -> Result<Self> {
        let Some((resource, action)) = raw.split_once('.') else {
            return Err(AuthzError::malformed_key(raw, "expected <resource>.<ACTION>"));
        };
        if action.contains('.') {
            return Err(AuthzError::malformed_key(raw, "more than one '.'"));
        }
        if resource.is_empty()
            || !resource
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(AuthzError::malformed_key(
                raw,
                "resource must be lowercase alphanumeric",
            ));
        }
        if action.is_empty() || !action.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
            return Err(AuthzError::malformed_key(raw, "action must be uppercase"));
        }
        Ok(Self(raw.to_string()))
    }

    /// Build a key from its two components.
    pub fn new(resource: &str, action: &str) -> Result<Self> {
        Self::parse(&format!("{}.{}", resource, action))
    }

    /// The resource component (`article` in `article.UPDATE`).
    pub fn resource(&self) -> &str {
        self.0.split_once('.').map(|(r, _)| r).unwrap_or(&self.0)
    }

    /// The action component (`UPDATE` in `article.UPDATE`).
    pub fn action(&self) -> &str {
        self.0.split_once('.').map(|(_, a)| a).unwrap_or("")
    }

    /// Whether the key targets a resource that manages access itself.
    pub fn is_administrative(&self) -> bool {
        ADMIN_RESOURCES.contains(&self.resource())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PermissionKey {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PermissionKey> for String {
    fn from(key: PermissionKey) -> Self {
        key.0
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub key: PermissionKey,
    #[serde(default)]
    pub description: String,
}

impl Permission {
    pub fn new(key: PermissionKey, description: impl Into<String>) -> Self {
        Self {
            key,
            description: description.into(),
        }
    }
}

/// A set of permission keys granted to a role or a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    keys: BTreeSet<PermissionKey>,
}

impl PermissionSet {
    /// Create an empty permission set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a permission set from a collection of keys.
    pub fn from_keys<I: IntoIterator<Item = PermissionKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }

    /// Parse every string into a key.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed key.
    pub fn parse_all<I, S>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = iter
            .into_iter()
            .map(|s| PermissionKey::parse(s.as_ref()))
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Self { keys })
    }

    pub fn add(&mut self, key: PermissionKey) {
        self.keys.insert(key);
    }

    pub fn remove(&mut self, key: &PermissionKey) -> bool {
        self.keys.remove(key)
    }

    pub fn contains(&self, key: &PermissionKey) -> bool {
        self.keys.contains(key)
    }

    /// Look up by raw string without validating it.
    pub fn contains_str(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k.as_str() == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Merge another permission set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        self.keys.extend(other.keys.iter().cloned());
    }
}

impl FromIterator<PermissionKey> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = PermissionKey>>(iter: I) -> Self {
        Self::from_keys(iter)
    }
}

/// The canonical set of valid permission keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionCatalog {
    entries: BTreeMap<PermissionKey, Permission>,
}

impl PermissionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `RESOURCES` x `ACTIONS` combination.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        for resource in RESOURCES {
            for action in ACTIONS {
                let key = PermissionKey(format!("{}.{}", resource, action));
                let description = format!("{} {}", action.to_lowercase(), resource_label(resource));
                catalog
                    .entries
                    .insert(key.clone(), Permission::new(key, description));
            }
        }
        catalog
    }

    /// Insert a permission.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::DuplicatePermission`] if the key already exists.
    pub fn insert(&mut self, permission: Permission) -> Result<()> {
        if self.entries.contains_key(&permission.key) {
            return Err(AuthzError::DuplicatePermission {
                key: permission.key.to_string(),
            });
        }
        self.entries.insert(permission.key.clone(), permission);
        Ok(())
    }

    pub fn remove(&mut self, key: &PermissionKey) -> Option<Permission> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &PermissionKey) -> Option<&Permission> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &PermissionKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Membership test on a raw string; malformed strings are simply absent.
    pub fn contains_str(&self, key: &str) -> bool {
        PermissionKey::parse(key)
            .map(|k| self.contains(&k))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PermissionKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Permission> for PermissionCatalog {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|p| (p.key.clone(), p)).collect(),
        }
    }
}

/// Plural, human-readable name of a resource for user-facing messages.
pub fn resource_label(resource: &str) -> &str {
    match resource {
        "article" => "articles",
        "author" => "authors",
        "callforpapers" => "calls for papers",
        "editorialboard" => "editorial board members",
        "notification" => "notifications",
        "permission" => "permissions",
        "role" => "roles",
        "user" => "users",
        other => other,
    }
}
