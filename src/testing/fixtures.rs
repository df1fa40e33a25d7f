//! A seeded journal for gateway-level unit tests.
//!
//! Content comes from [`crate::store::demo`]; its user and article
//! constants are re-exported here.

use crate::audit::AuditLogger;
use crate::authz::User;
use crate::config::AuthzConfig;
use crate::gateway::ActionGateway;
use crate::store::demo::demo_state;
use crate::store::MemoryStore;
use std::sync::Arc;
use tempfile::TempDir;

pub use crate::store::demo::{
    ADMIN_EMAIL, AUTHOR_EMAIL, COAUTHOR_EMAIL, EDITOR_EMAIL, OTHER_ARTICLE, OWNED_ARTICLE,
    SUPER_ADMIN_EMAIL, VIEWER_EMAIL,
};

/// A seeded journal on disk with an audited gateway.
pub struct TestJournal {
    pub temp_dir: TempDir,
    pub store: Arc<MemoryStore>,
    pub gateway: ActionGateway<MemoryStore>,
}

impl TestJournal {
    /// # Panics
    ///
    /// Panics if the temporary journal cannot be created.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = AuthzConfig::default();
        let store = Arc::new(
            MemoryStore::create(&config.store_path(temp_dir.path()), demo_state())
                .expect("Failed to create store"),
        );
        let gateway = ActionGateway::open(Arc::clone(&store), &config)
            .await
            .expect("Failed to open gateway")
            .with_audit(audit_logger(&temp_dir));
        Self {
            temp_dir,
            store,
            gateway,
        }
    }

    /// # Panics
    ///
    /// Panics if the user does not exist.
    pub async fn user(&self, email: &str) -> User {
        self.gateway
            .resolve_user(email)
            .await
            .expect("Failed to resolve user")
            .expect("No such user")
    }

    /// A second logger over the same audit file.
    pub fn audit(&self) -> AuditLogger {
        audit_logger(&self.temp_dir)
    }
}

fn audit_logger(temp_dir: &TempDir) -> AuditLogger {
    AuditLogger::new(temp_dir.path().to_path_buf()).expect("Failed to create audit logger")
}
