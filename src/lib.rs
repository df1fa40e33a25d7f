//! journal-authz - Role-based authorization for an academic journal CMS
//!
//! Gates every administrative mutation of the journal (articles, authors,
//! calls for papers, permissions, roles, users) behind a permission check,
//! with author ownership of articles as the only resource-level rule.
//!
//! # Architecture
//!
//! - [`authz`] - Permission keys, roles, the hierarchy and the checker
//! - [`gateway`] - Authorize-then-mutate admin actions with uniform responses
//! - [`store`] - Content store traits and the JSON-snapshot memory store
//! - [`audit`] - Hash-chained audit trail of gated actions
//! - [`config`] - Seed model, hierarchy and ownership configuration
//! - [`error`] - Custom error types and handling
//! - [`testing`] - Mocks and fixtures
//!
//! # Example
//!
//! ```rust,ignore
//! use journal_authz::config::AuthzConfig;
//! use journal_authz::gateway::ActionGateway;
//! use journal_authz::store::MemoryStore;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let config = AuthzConfig::load(Path::new("."))?;
//! let store = Arc::new(MemoryStore::open(&config.store_path(Path::new(".")))?);
//! let gateway = ActionGateway::open(store, &config).await?;
//!
//! let actor = gateway.resolve_user("ada@journal.test").await?;
//! let response = gateway.delete_article(actor.as_ref(), "art-1").await;
//! println!("{}", serde_json::to_string(&response)?);
//! ```

pub mod audit;
pub mod authz;
pub mod config;
pub mod error;
pub mod gateway;
pub mod store;
pub mod testing;

// Re-export commonly used types
pub use error::{AuthzError, IntoAuthzError, Result};

// Re-export authorization types
pub use authz::{
    check, Catalog, CatalogCache, Decision, DecisionBasis, PermissionChecker, PermissionKey,
    PermissionSet, ResourceOwnershipContext, ResourceType, Role, RoleHierarchy, User,
};

// Re-export config and audit types
pub use audit::{AuditEntry, AuditLogger, AuditOutcome, VerificationResult};
pub use config::{AuthzConfig, ConfigValidator, ValidationReport};

// Re-export gateway and store types
pub use gateway::{ActionGateway, ActionResponse, UNEXPECTED_ERROR};
pub use store::{AuthorDirectory, ContentStore, MemoryStore};

// Test fixtures are only available in test builds
#[cfg(test)]
pub use testing::TestJournal;
