//! Custom error types for journal-authz.
//!
//! Authorization *denials* are not errors: the checker returns them as a
//! [`Decision`](crate::authz::Decision). The variants here cover operator
//! and programmer mistakes (bad configuration, malformed keys, broken
//! referential integrity) and store failures.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for journal-authz operations
#[derive(Error, Debug)]
pub enum AuthzError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    /// Missing required file
    #[error("Missing required file: {path}")]
    MissingFile { path: PathBuf },

    // =========================================================================
    // Model Errors
    // =========================================================================
    /// Permission key does not have the `<resource>.<ACTION>` shape
    #[error("Malformed permission key '{key}': {reason}")]
    MalformedPermissionKey { key: String, reason: String },

    /// A role or user override references a key missing from the catalog
    #[error("{owner} references unknown permission '{key}'")]
    UnknownPermissionReference { owner: String, key: String },

    /// Two roles share a name
    #[error("Duplicate role: {name}")]
    DuplicateRole { name: String },

    /// Two permissions share a key
    #[error("Duplicate permission: {key}")]
    DuplicatePermission { key: String },

    /// Two users share an email
    #[error("A user with email '{email}' already exists")]
    DuplicateUser { email: String },

    /// Two author records share an email
    #[error("An author with email '{email}' already exists")]
    DuplicateAuthor { email: String },

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// Entity lookup failed
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Deletion blocked because the entity is still assigned
    #[error("Cannot delete {entity} '{id}': still assigned {total_assignments} time(s)")]
    AssignmentInUse {
        entity: String,
        id: String,
        total_assignments: usize,
    },

    /// System roles cannot be deleted
    #[error("Role '{name}' is a system role and cannot be deleted")]
    SystemRoleProtected { name: String },

    /// Store backend failure
    #[error("Store error: {message}")]
    Store { message: String },

    // =========================================================================
    // Audit Errors
    // =========================================================================
    /// Audit trail could not be written or read
    #[error("Audit error: {message}")]
    Audit { message: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AuthzError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed key error
    pub fn malformed_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPermissionKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an audit error
    pub fn audit(message: impl Into<String>) -> Self {
        Self::Audit {
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if this error is caused by the request rather than the system.
    ///
    /// Client errors are safe to show to the admin UI verbatim.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::AssignmentInUse { .. }
                | Self::SystemRoleProtected { .. }
                | Self::UnknownPermissionReference { .. }
                | Self::DuplicateRole { .. }
                | Self::DuplicatePermission { .. }
                | Self::DuplicateUser { .. }
                | Self::DuplicateAuthor { .. }
        )
    }

    /// Check if this error indicates a bug at the call site
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, Self::MalformedPermissionKey { .. })
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => 4,
            Self::AssignmentInUse { .. } | Self::SystemRoleProtected { .. } => 5,
            Self::MissingFile { .. } => 6,
            Self::Config { .. } | Self::InvalidConfig { .. } => 7,
            _ => 1,
        }
    }
}

/// Type alias for journal-authz results
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Extension trait for converting foreign errors to AuthzError
pub trait IntoAuthzError<T> {
    fn into_authz_config(self) -> Result<T>;
    fn into_authz_store(self) -> Result<T>;
    fn into_authz_audit(self) -> Result<T>;
}

impl<T, E: Into<anyhow::Error>> IntoAuthzError<T> for std::result::Result<T, E> {
    fn into_authz_config(self) -> Result<T> {
        self.map_err(|e| AuthzError::config(e.into().to_string()))
    }

    fn into_authz_store(self) -> Result<T> {
        self.map_err(|e| AuthzError::store(e.into().to_string()))
    }

    fn into_authz_audit(self) -> Result<T> {
        self.map_err(|e| AuthzError::audit(e.into().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthzError::AssignmentInUse {
            entity: "permission".into(),
            id: "article.DELETE".into(),
            total_assignments: 3,
        };
        assert!(err.to_string().contains("article.DELETE"));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_is_client_error() {
        assert!(AuthzError::not_found("article", "a1").is_client_error());
        assert!(AuthzError::SystemRoleProtected {
            name: "Admin".into()
        }
        .is_client_error());
        assert!(!AuthzError::store("disk full").is_client_error());
        assert!(!AuthzError::malformed_key("x", "no dot").is_client_error());
    }

    #[test]
    fn test_is_programmer_error() {
        assert!(AuthzError::malformed_key("article", "missing action").is_programmer_error());
        assert!(!AuthzError::config("bad").is_programmer_error());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AuthzError::not_found("user", "u1").exit_code(), 4);
        assert_eq!(
            AuthzError::SystemRoleProtected {
                name: "Viewer".into()
            }
            .exit_code(),
            5
        );
        assert_eq!(AuthzError::config("test").exit_code(), 7);
        assert_eq!(AuthzError::store("test").exit_code(), 1);
    }

    #[test]
    fn test_config_with_path() {
        let path = PathBuf::from("/data/.journal/authz.json");
        let err = AuthzError::config_with_path("failed to parse", path.clone());
        if let AuthzError::Config {
            message,
            path: opt_path,
        } = err
        {
            assert_eq!(message, "failed to parse");
            assert_eq!(opt_path, Some(path));
        } else {
            panic!("Wrong error variant");
        }
    }

    #[test]
    fn test_into_authz_error_trait() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "snapshot missing",
        ));

        match result.into_authz_store() {
            Err(AuthzError::Store { message }) => assert!(message.contains("snapshot missing")),
            other => panic!("Wrong error variant after conversion: {:?}", other),
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: AuthzError = io_err.into();
        assert!(matches!(err, AuthzError::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }
}
