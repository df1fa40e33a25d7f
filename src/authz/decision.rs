//! Authorization outcomes and the optional resource context of a check.

use crate::error::AuthzError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";
pub const UNKNOWN_PERMISSION: &str = "Unknown permission";
pub const PERMISSION_DENIED: &str = "You don't have permission to perform this action";

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBasis {
    /// The user holds the Super Admin role.
    SuperAdmin,
    /// The key is granted by the user's role.
    RoleGrant,
    /// The key is granted by a per-user override.
    OverrideGrant,
    /// The user owns the resource and the key is ownership-scoped.
    OwnerGrant,
    /// No user was supplied.
    AuthenticationRequired,
    /// The key is not in the catalog.
    UnknownPermission,
    /// The user lacks the key.
    PermissionDenied,
}

impl DecisionBasis {
    pub fn is_allow(self) -> bool {
        matches!(
            self,
            Self::SuperAdmin | Self::RoleGrant | Self::OverrideGrant | Self::OwnerGrant
        )
    }
}

impl fmt::Display for DecisionBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SuperAdmin => "super_admin",
            Self::RoleGrant => "role_grant",
            Self::OverrideGrant => "override_grant",
            Self::OwnerGrant => "owner_grant",
            Self::AuthenticationRequired => "authentication_required",
            Self::UnknownPermission => "unknown_permission",
            Self::PermissionDenied => "permission_denied",
        };
        write!(f, "{}", s)
    }
}

/// The result of a permission check. `reason` is always set on denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub basis: DecisionBasis,
}

impl Decision {
    pub fn allow(basis: DecisionBasis) -> Self {
        debug_assert!(basis.is_allow());
        Self {
            allowed: true,
            reason: None,
            basis,
        }
    }

    pub fn deny(basis: DecisionBasis, reason: impl Into<String>) -> Self {
        debug_assert!(!basis.is_allow());
        Self {
            allowed: false,
            reason: Some(reason.into()),
            basis,
        }
    }

    pub fn authentication_required() -> Self {
        Self::deny(DecisionBasis::AuthenticationRequired, AUTHENTICATION_REQUIRED)
    }

    pub fn unknown_permission() -> Self {
        Self::deny(DecisionBasis::UnknownPermission, UNKNOWN_PERMISSION)
    }

    pub fn reason_or_default(&self) -> &str {
        self.reason.as_deref().unwrap_or(PERMISSION_DENIED)
    }
}

/// Resource types the ownership resolver knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Article,
    Author,
    CallForPapers,
    EditorialBoard,
    Notification,
    Permission,
    Role,
    User,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Author => "author",
            Self::CallForPapers => "callforpapers",
            Self::EditorialBoard => "editorialboard",
            Self::Notification => "notification",
            Self::Permission => "permission",
            Self::Role => "role",
            Self::User => "user",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceType {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "article" => Ok(Self::Article),
            "author" => Ok(Self::Author),
            "callforpapers" => Ok(Self::CallForPapers),
            "editorialboard" => Ok(Self::EditorialBoard),
            "notification" => Ok(Self::Notification),
            "permission" => Ok(Self::Permission),
            "role" => Ok(Self::Role),
            "user" => Ok(Self::User),
            _ => Err(AuthzError::invalid_config(
                "resource_type",
                format!("unknown resource type '{}'", s),
            )),
        }
    }
}

/// Identifies the resource instance a check is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOwnershipContext {
    pub resource_id: String,
    pub resource_type: ResourceType,
}

impl ResourceOwnershipContext {
    pub fn new(resource_type: ResourceType, resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            resource_type,
        }
    }

    pub fn article(id: impl Into<String>) -> Self {
        Self::new(ResourceType::Article, id)
    }
}
