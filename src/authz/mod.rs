//! Role-based authorization for the journal admin surface.
//!
//! This module provides:
//! - Permission keys and the permission catalog
//! - Roles, the role hierarchy and authenticated users
//! - Ownership resolution for author-owned articles
//! - The permission checker and its decisions

pub mod catalog;
pub mod checker;
pub mod decision;
pub mod hierarchy;
pub mod ownership;
pub mod permission;
pub mod role;
pub mod user;

// Re-export main types
pub use catalog::{Catalog, CatalogCache, DEFAULT_OWNERSHIP_SCOPED};
pub use checker::{check, denial_message, PermissionChecker};
pub use decision::{Decision, DecisionBasis, ResourceOwnershipContext, ResourceType};
pub use hierarchy::RoleHierarchy;
pub use ownership::{DirectoryOwnershipResolver, NoOwnership, OwnershipResolver};
pub use permission::{resource_label, Permission, PermissionCatalog, PermissionKey, PermissionSet};
pub use role::{PermissionCheck, Role, RoleBuilder, ADMIN, AUTHOR, EDITOR, SUPER_ADMIN, VIEWER};
pub use user::{normalize_email, User};
