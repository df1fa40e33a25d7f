//! Authorization configuration.
//!
//! Loaded from `<data-dir>/.journal/authz.json` (camelCase keys), or from
//! `authz.toml` next to it when no JSON file exists. Missing files fall back
//! to the built-in catalog.
//!
//! ```json
//! {
//!   "roleHierarchy": ["Viewer", "Author", "Editor", "Admin", "Super Admin"],
//!   "ownershipScoped": ["article.UPDATE", "article.DELETE"],
//!   "storePath": ".journal/store.json",
//!   "audit": { "enabled": true, "maxSizeBytes": 10485760, "maxFiles": 10 }
//! }
//! ```
//!
//! `permissions` and `roles` seed the store on `init`; when omitted the
//! standard catalog and the five system roles are used.

pub mod validation;

pub use validation::{ConfigValidator, ValidationReport};

use crate::audit::{RotationConfig, JOURNAL_DIR};
use crate::authz::catalog::DEFAULT_OWNERSHIP_SCOPED;
use crate::authz::role::default_roles;
use crate::authz::{
    Catalog, Permission, PermissionCatalog, PermissionKey, PermissionSet, Role, RoleHierarchy,
};
use crate::error::{AuthzError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A permission entry as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSeed {
    pub key: String,
    #[serde(default)]
    pub description: String,
}

/// A role entry as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_system: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(flatten)]
    pub rotation: RotationConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rotation: RotationConfig::default(),
        }
    }
}

/// Configuration loaded from `.journal/authz.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthzConfig {
    #[serde(default)]
    pub role_hierarchy: RoleHierarchy,

    #[serde(default = "default_ownership_scoped")]
    pub ownership_scoped: Vec<String>,

    #[serde(default)]
    pub permissions: Vec<PermissionSeed>,

    #[serde(default)]
    pub roles: Vec<RoleSeed>,

    /// Store snapshot path, relative to the data dir unless absolute.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default)]
    pub audit: AuditConfig,
}

fn default_true() -> bool {
    true
}

fn default_ownership_scoped() -> Vec<String> {
    DEFAULT_OWNERSHIP_SCOPED.iter().map(|k| k.to_string()).collect()
}

fn default_store_path() -> PathBuf {
    PathBuf::from(JOURNAL_DIR).join("store.json")
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            role_hierarchy: RoleHierarchy::default(),
            ownership_scoped: default_ownership_scoped(),
            permissions: Vec::new(),
            roles: Vec::new(),
            store_path: default_store_path(),
            audit: AuditConfig::default(),
        }
    }
}

impl AuthzConfig {
    /// Load configuration from a data directory.
    pub fn load(data_dir: &Path) -> anyhow::Result<Self> {
        let json_path = Self::config_path(data_dir);
        if json_path.exists() {
            let content = std::fs::read_to_string(&json_path)
                .with_context(|| format!("Failed to read {}", json_path.display()))?;
            let config: AuthzConfig = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", json_path.display()))?;
            return Ok(config);
        }

        let toml_path = Self::toml_path(data_dir);
        if toml_path.exists() {
            let content = std::fs::read_to_string(&toml_path)
                .with_context(|| format!("Failed to read {}", toml_path.display()))?;
            let config: AuthzConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", toml_path.display()))?;
            return Ok(config);
        }

        Ok(Self::default())
    }

    /// Write the configuration as pretty JSON and return its path.
    pub fn save(&self, data_dir: &Path) -> anyhow::Result<PathBuf> {
        let path = Self::config_path(data_dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// The config with the standard permissions and roles written out, as
    /// produced by `init`.
    pub fn with_standard_seed() -> Self {
        let permissions = PermissionCatalog::standard()
            .iter()
            .map(|p| PermissionSeed {
                key: p.key.to_string(),
                description: p.description.clone(),
            })
            .collect();
        let roles = default_roles()
            .into_iter()
            .map(|r| RoleSeed {
                name: r.name,
                description: r.description,
                is_system: r.is_system,
                permissions: r.permissions.iter().map(ToString::to_string).collect(),
            })
            .collect();
        Self {
            permissions,
            roles,
            ..Self::default()
        }
    }

    pub fn config_path(data_dir: &Path) -> PathBuf {
        data_dir.join(JOURNAL_DIR).join("authz.json")
    }

    pub fn toml_path(data_dir: &Path) -> PathBuf {
        data_dir.join(JOURNAL_DIR).join("authz.toml")
    }

    /// Resolved store snapshot path.
    pub fn store_path(&self, data_dir: &Path) -> PathBuf {
        if self.store_path.is_absolute() {
            self.store_path.clone()
        } else {
            data_dir.join(&self.store_path)
        }
    }

    /// Seed permissions; the standard catalog when none are configured.
    ///
    /// # Errors
    ///
    /// Malformed or duplicate keys.
    pub fn seed_permissions(&self) -> Result<PermissionCatalog> {
        if self.permissions.is_empty() {
            return Ok(PermissionCatalog::standard());
        }
        let mut catalog = PermissionCatalog::new();
        for seed in &self.permissions {
            catalog.insert(Permission::new(
                PermissionKey::parse(&seed.key)?,
                seed.description.clone(),
            ))?;
        }
        Ok(catalog)
    }

    /// Seed roles; the system roles when none are configured.
    ///
    /// Configured roles get the stable `role-<name>` id.
    ///
    /// # Errors
    ///
    /// Malformed keys.
    pub fn seed_roles(&self) -> Result<Vec<Role>> {
        if self.roles.is_empty() {
            return Ok(default_roles());
        }
        self.roles
            .iter()
            .map(|seed| {
                Ok(Role {
                    id: Role::system_id(&seed.name),
                    name: seed.name.clone(),
                    description: seed.description.clone(),
                    is_system: seed.is_system,
                    permissions: PermissionSet::parse_all(&seed.permissions)?,
                })
            })
            .collect()
    }

    /// Parsed ownership allow-list.
    ///
    /// # Errors
    ///
    /// Malformed keys.
    pub fn ownership_keys(&self) -> Result<Vec<PermissionKey>> {
        self.ownership_scoped
            .iter()
            .map(|k| PermissionKey::parse(k))
            .collect()
    }

    /// Build a catalog from explicit permissions and roles using this
    /// config's hierarchy and ownership allow-list.
    ///
    /// # Errors
    ///
    /// See [`Catalog::new`].
    pub fn catalog_with(&self, permissions: PermissionCatalog, roles: Vec<Role>) -> Result<Catalog> {
        Catalog::new(
            permissions,
            roles,
            self.role_hierarchy.clone(),
            self.ownership_keys()?,
        )
    }

    /// Build the catalog for a stored model. Allow-listed keys that the store
    /// no longer holds are kept on the allow-list but are not in effect.
    ///
    /// # Errors
    ///
    /// See [`Catalog::from_stored`].
    pub fn stored_catalog(&self, permissions: PermissionCatalog, roles: Vec<Role>) -> Result<Catalog> {
        Catalog::from_stored(
            permissions,
            roles,
            self.role_hierarchy.clone(),
            self.ownership_keys()?,
        )
    }

    /// Build the seed catalog described by this config.
    ///
    /// # Errors
    ///
    /// Any validation failure of [`Catalog::new`] or a malformed key.
    pub fn seed_catalog(&self) -> Result<Catalog> {
        self.catalog_with(self.seed_permissions()?, self.seed_roles()?)
    }

    /// Check the configuration without failing fast.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        let permissions = match self.seed_permissions() {
            Ok(p) => Some(p),
            Err(e) => {
                report.errors.push(format!("permissions: {}", e));
                None
            }
        };

        let roles = match self.seed_roles() {
            Ok(r) => Some(r),
            Err(e) => {
                report.errors.push(format!("roles: {}", e));
                None
            }
        };

        if let Err(e) = self.ownership_keys() {
            report.errors.push(format!("ownershipScoped: {}", e));
        }

        if let (Some(permissions), Some(roles)) = (permissions, roles) {
            if let Err(e) = self.catalog_with(permissions, roles.clone()) {
                report.errors.push(e.to_string());
            }

            if !roles.iter().any(Role::is_super_admin) {
                report
                    .warnings
                    .push("no 'Super Admin' role is configured".to_string());
            }
            for name in self.role_hierarchy.names() {
                if !roles.iter().any(|r| r.name == name) {
                    report.warnings.push(format!(
                        "roleHierarchy names '{}' but no such role is configured",
                        name
                    ));
                }
            }
            for role in &roles {
                if self.role_hierarchy.rank(&role.name).is_none() {
                    report.warnings.push(format!(
                        "role '{}' is not ranked and can only be assigned by Super Admin",
                        role.name
                    ));
                }
            }
        }

        let mut seen = std::collections::BTreeSet::new();
        for name in self.role_hierarchy.names() {
            if !seen.insert(name) {
                report
                    .errors
                    .push(format!("roleHierarchy lists '{}' more than once", name));
            }
        }

        if self.audit.enabled && self.audit.rotation.max_size_bytes == 0 {
            report
                .errors
                .push("audit.maxSizeBytes must be greater than 0".to_string());
        }
        if self.audit.enabled && self.audit.rotation.max_files == 0 {
            report
                .warnings
                .push("audit.maxFiles is 0; rotated audit files are deleted immediately".to_string());
        }

        report
    }

    /// Fail with the first validation error, if any.
    ///
    /// # Errors
    ///
    /// [`AuthzError::InvalidConfig`] carrying the first error.
    pub fn ensure_valid(&self) -> Result<()> {
        match self.validate().errors.into_iter().next() {
            Some(first) => Err(AuthzError::invalid_config("authz.json", first)),
            None => Ok(()),
        }
    }
}
