//! The permission checker.
//!
//! [`check`] is the single authorization contract: given an optional user,
//! a permission key and an optional resource context, it returns a
//! [`Decision`]. The rules are applied in order:
//!
//! 1. no user denies with "Authentication required"
//! 2. Super Admin allows
//! 3. a key missing from the catalog denies with "Unknown permission"
//! 4. a role grant or a user override allows
//! 5. an ownership-scoped key allows when the user owns the resource
//! 6. anything else denies
//!
//! # Example
//!
//! ```rust
//! use journal_authz::authz::{check, Catalog, NoOwnership, User};
//!
//! let catalog = Catalog::standard();
//! let editor = catalog.role("Editor").cloned().unwrap();
//! let user = User::new("u1", "ed@example.org", editor);
//!
//! assert!(check(&catalog, &NoOwnership, Some(&user), "article.DELETE", None).allowed);
//! assert!(!check(&catalog, &NoOwnership, Some(&user), "user.DELETE", None).allowed);
//! assert!(!check(&catalog, &NoOwnership, None, "article.READ", None).allowed);
//! ```

use super::catalog::{Catalog, CatalogCache};
use super::decision::{Decision, DecisionBasis, ResourceOwnershipContext};
use super::ownership::OwnershipResolver;
use super::permission::{resource_label, PermissionKey};
use super::user::User;
use std::sync::Arc;

/// Evaluate one permission check against a catalog snapshot.
///
/// Pure apart from tracing and the resolver call in rule 5. Never panics:
/// malformed keys deny as unknown and are logged at error level.
pub fn check(
    catalog: &Catalog,
    resolver: &dyn OwnershipResolver,
    user: Option<&User>,
    permission_key: &str,
    context: Option<&ResourceOwnershipContext>,
) -> Decision {
    let Some(user) = user else {
        return Decision::authentication_required();
    };

    if user.is_super_admin() {
        return Decision::allow(DecisionBasis::SuperAdmin);
    }

    let key = match PermissionKey::parse(permission_key) {
        Ok(key) if catalog.permissions().contains(&key) => key,
        Ok(_) => {
            tracing::warn!(user = %user.id, key = permission_key, "check against unknown permission");
            return Decision::unknown_permission();
        }
        Err(e) => {
            tracing::error!(user = %user.id, error = %e, "malformed permission key at call site");
            return Decision::unknown_permission();
        }
    };

    if user.role.permissions.contains(&key) {
        return Decision::allow(DecisionBasis::RoleGrant);
    }
    if user.overrides.contains(&key) {
        return Decision::allow(DecisionBasis::OverrideGrant);
    }

    if catalog.is_ownership_scoped(&key) {
        if let Some(ctx) = context {
            if resolver.is_owner(user, ctx.resource_type, &ctx.resource_id) {
                tracing::debug!(
                    user = %user.id,
                    key = %key,
                    resource = %ctx.resource_id,
                    "allowed through ownership"
                );
                return Decision::allow(DecisionBasis::OwnerGrant);
            }
        }
    }

    Decision::deny(DecisionBasis::PermissionDenied, denial_message(&key))
}

/// User-facing denial text for a key, e.g. "You don't have permission to
/// update articles".
pub fn denial_message(key: &PermissionKey) -> String {
    format!(
        "You don't have permission to {} {}",
        key.action().to_lowercase(),
        resource_label(key.resource())
    )
}

/// Checker bound to a catalog cache and an ownership resolver.
#[derive(Debug)]
pub struct PermissionChecker<R> {
    cache: Arc<CatalogCache>,
    resolver: R,
}

impl<R> PermissionChecker<R> {
    pub fn new(cache: Arc<CatalogCache>, resolver: R) -> Self {
        Self { cache, resolver }
    }

    /// The current catalog snapshot.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.cache.snapshot()
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}

impl<R: OwnershipResolver> PermissionChecker<R> {
    /// See [`check`].
    pub fn check(
        &self,
        user: Option<&User>,
        permission_key: &str,
        context: Option<&ResourceOwnershipContext>,
    ) -> Decision {
        let catalog = self.cache.snapshot();
        check(&catalog, &self.resolver, user, permission_key, context)
    }

    /// Allowed only if every key is allowed. Returns the first denial.
    ///
    /// An empty key list denies as unknown.
    pub fn check_all(
        &self,
        user: Option<&User>,
        keys: &[&str],
        context: Option<&ResourceOwnershipContext>,
    ) -> Decision {
        let catalog = self.cache.snapshot();
        let mut result = Decision::unknown_permission();
        for key in keys {
            result = check(&catalog, &self.resolver, user, key, context);
            if !result.allowed {
                return result;
            }
        }
        result
    }

    /// Allowed if any key is allowed. Returns the last denial otherwise.
    ///
    /// An empty key list denies as unknown.
    pub fn check_any(
        &self,
        user: Option<&User>,
        keys: &[&str],
        context: Option<&ResourceOwnershipContext>,
    ) -> Decision {
        let catalog = self.cache.snapshot();
        let mut result = Decision::unknown_permission();
        for key in keys {
            result = check(&catalog, &self.resolver, user, key, context);
            if result.allowed {
                return result;
            }
        }
        result
    }

    /// Whether `actor` may assign the role named `target_role`.
    pub fn can_assign(&self, actor: Option<&User>, target_role: &str) -> bool {
        match actor {
            Some(actor) => self.cache.snapshot().hierarchy().can_assign(&actor.role, target_role),
            None => false,
        }
    }
}
