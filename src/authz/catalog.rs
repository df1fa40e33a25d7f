//! Catalog snapshots and the process-wide catalog cache.
//!
//! A [`Catalog`] is an immutable, validated view of every permission, role,
//! the role hierarchy and the ownership allow-list. [`CatalogCache`] hands
//! out `Arc` snapshots to readers and is reloaded explicitly whenever a role
//! or permission is mutated.

use super::hierarchy::RoleHierarchy;
use super::ownership::OWNABLE_RESOURCES;
use super::permission::{PermissionCatalog, PermissionKey, PermissionSet};
use super::role::{default_roles, Role};
use crate::error::{AuthzError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Keys that are ownership-scoped unless configured otherwise.
pub const DEFAULT_OWNERSHIP_SCOPED: &[&str] = &["article.UPDATE", "article.DELETE"];

/// A validated snapshot of the role/permission model.
///
/// The configured ownership allow-list is kept apart from the effective one.
/// Only keys present in the current permission set are effective, and every
/// rebuild recomputes that intersection from the configured list.
#[derive(Debug, Clone)]
pub struct Catalog {
    permissions: PermissionCatalog,
    roles: BTreeMap<String, Role>,
    hierarchy: RoleHierarchy,
    ownership_allow_list: BTreeSet<PermissionKey>,
    ownership_scoped: BTreeSet<PermissionKey>,
}

impl Catalog {
    /// Build and validate a catalog.
    ///
    /// # Errors
    ///
    /// - [`AuthzError::DuplicateRole`] when two roles share a name
    /// - [`AuthzError::UnknownPermissionReference`] when a role grants a key
    ///   missing from `permissions`
    /// - [`AuthzError::InvalidConfig`] when an ownership-scoped key is
    ///   unknown or targets a resource without an ownership concept
    pub fn new(
        permissions: PermissionCatalog,
        roles: Vec<Role>,
        hierarchy: RoleHierarchy,
        ownership_scoped: impl IntoIterator<Item = PermissionKey>,
    ) -> Result<Self> {
        let allow_list: BTreeSet<PermissionKey> = ownership_scoped.into_iter().collect();
        if let Some(key) = allow_list.iter().find(|k| !permissions.contains(k)) {
            return Err(AuthzError::invalid_config(
                "ownershipScoped",
                format!("'{}' is not in the permission catalog", key),
            ));
        }
        Self::assemble(permissions, roles, hierarchy, allow_list)
    }

    /// Build a catalog over a stored model that may lack some of the
    /// configured ownership-scoped keys. Missing keys stay on the allow-list
    /// and take effect again once the permission exists.
    ///
    /// # Errors
    ///
    /// Same as [`Catalog::new`], except that allow-listed keys missing from
    /// `permissions` are accepted.
    pub fn from_stored(
        permissions: PermissionCatalog,
        roles: Vec<Role>,
        hierarchy: RoleHierarchy,
        ownership_allow_list: impl IntoIterator<Item = PermissionKey>,
    ) -> Result<Self> {
        Self::assemble(
            permissions,
            roles,
            hierarchy,
            ownership_allow_list.into_iter().collect(),
        )
    }

    fn assemble(
        permissions: PermissionCatalog,
        roles: Vec<Role>,
        hierarchy: RoleHierarchy,
        ownership_allow_list: BTreeSet<PermissionKey>,
    ) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for role in roles {
            for key in role.permissions.iter() {
                if !permissions.contains(key) {
                    return Err(AuthzError::UnknownPermissionReference {
                        owner: format!("role '{}'", role.name),
                        key: key.to_string(),
                    });
                }
            }
            if by_name.contains_key(&role.name) {
                return Err(AuthzError::DuplicateRole { name: role.name });
            }
            by_name.insert(role.name.clone(), role);
        }

        for key in &ownership_allow_list {
            if key.is_administrative() || !OWNABLE_RESOURCES.contains(&key.resource()) {
                return Err(AuthzError::invalid_config(
                    "ownershipScoped",
                    format!("'{}' targets a resource without owners", key),
                ));
            }
        }
        let ownership_scoped = ownership_allow_list
            .iter()
            .filter(|k| permissions.contains(k))
            .cloned()
            .collect();

        Ok(Self {
            permissions,
            roles: by_name,
            hierarchy,
            ownership_allow_list,
            ownership_scoped,
        })
    }

    /// The built-in catalog: standard keys, five system roles, default
    /// hierarchy and `article.UPDATE`/`article.DELETE` ownership scoping.
    pub fn standard() -> Self {
        let scoped: BTreeSet<PermissionKey> = DEFAULT_OWNERSHIP_SCOPED
            .iter()
            .filter_map(|k| PermissionKey::parse(k).ok())
            .collect();
        Self {
            permissions: PermissionCatalog::standard(),
            roles: default_roles()
                .into_iter()
                .map(|r| (r.name.clone(), r))
                .collect(),
            hierarchy: RoleHierarchy::default(),
            ownership_allow_list: scoped.clone(),
            ownership_scoped: scoped,
        }
    }

    /// Build the next snapshot after a role or permission mutation.
    ///
    /// The hierarchy and the configured ownership allow-list are carried
    /// over; the effective ownership set is recomputed against `permissions`.
    ///
    /// # Errors
    ///
    /// Same as [`Catalog::from_stored`].
    pub fn rebuild(&self, permissions: PermissionCatalog, roles: Vec<Role>) -> Result<Self> {
        Self::assemble(
            permissions,
            roles,
            self.hierarchy.clone(),
            self.ownership_allow_list.clone(),
        )
    }

    pub fn permissions(&self) -> &PermissionCatalog {
        &self.permissions
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    pub fn role_by_id(&self, id: &str) -> Option<&Role> {
        self.roles.values().find(|r| r.id == id)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    pub fn is_ownership_scoped(&self, key: &PermissionKey) -> bool {
        self.ownership_scoped.contains(key)
    }

    pub fn ownership_scoped(&self) -> impl Iterator<Item = &PermissionKey> {
        self.ownership_scoped.iter()
    }

    /// The configured allow-list, including keys not currently in the catalog.
    pub fn ownership_allow_list(&self) -> impl Iterator<Item = &PermissionKey> {
        self.ownership_allow_list.iter()
    }

    /// Ensure every override key exists in the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::UnknownPermissionReference`] naming `owner`.
    pub fn validate_overrides(&self, owner: &str, overrides: &PermissionSet) -> Result<()> {
        match overrides.iter().find(|k| !self.permissions.contains(k)) {
            Some(key) => Err(AuthzError::UnknownPermissionReference {
                owner: owner.to_string(),
                key: key.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Number of roles granting `key`.
    pub fn roles_granting(&self, key: &PermissionKey) -> usize {
        self.roles
            .values()
            .filter(|r| r.permissions.contains(key))
            .count()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Read-mostly holder of the current catalog snapshot.
#[derive(Debug)]
pub struct CatalogCache {
    current: RwLock<Arc<Catalog>>,
    generation: AtomicU64,
}

impl CatalogCache {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
            generation: AtomicU64::new(0),
        }
    }

    /// The current snapshot. Holding it does not block reloads.
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the snapshot and return the new generation.
    pub fn reload(&self, catalog: Catalog) -> u64 {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, "catalog reloaded");
        generation
    }

    /// Bumped on every reload.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(Catalog::standard())
    }
}
