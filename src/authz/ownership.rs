//! Resource ownership resolution.
//!
//! Only articles have owners: a user owns an article when their linked
//! author record (matched by email) appears anywhere in the article's author
//! list. Every other resource type is blanket-permission-only.

use super::decision::ResourceType;
use super::user::{normalize_email, User};
use crate::store::AuthorDirectory;

/// Resources with an ownership concept.
pub const OWNABLE_RESOURCES: &[&str] = &["article"];

/// Decides whether a user owns a specific resource.
///
/// Implementations must fail closed: any lookup problem means "not owner".
pub trait OwnershipResolver: Send + Sync {
    fn is_owner(&self, user: &User, resource_type: ResourceType, resource_id: &str) -> bool;
}

/// Ownership resolver backed by the author directory.
#[derive(Debug, Clone)]
pub struct DirectoryOwnershipResolver<D> {
    directory: D,
}

impl<D: AuthorDirectory> DirectoryOwnershipResolver<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    fn owns_article(&self, user: &User, article_id: &str) -> bool {
        let email = normalize_email(&user.email);
        let author = match self.directory.author_by_email(&email) {
            Ok(Some(author)) => author,
            Ok(None) => {
                tracing::debug!(user = %user.id, "user has no linked author record");
                return false;
            }
            Err(e) => {
                tracing::warn!(user = %user.id, error = %e, "author lookup failed");
                return false;
            }
        };

        match self.directory.article_author_ids(article_id) {
            Ok(Some(author_ids)) => author_ids.iter().any(|id| *id == author.id),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(article = article_id, error = %e, "article author lookup failed");
                false
            }
        }
    }
}

impl<D: AuthorDirectory> OwnershipResolver for DirectoryOwnershipResolver<D> {
    fn is_owner(&self, user: &User, resource_type: ResourceType, resource_id: &str) -> bool {
        match resource_type {
            ResourceType::Article => self.owns_article(user, resource_id),
            _ => false,
        }
    }
}

/// Resolver that never grants ownership.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOwnership;

impl OwnershipResolver for NoOwnership {
    fn is_owner(&self, _user: &User, _resource_type: ResourceType, _resource_id: &str) -> bool {
        false
    }
}

impl<R: OwnershipResolver + ?Sized> OwnershipResolver for std::sync::Arc<R> {
    fn is_owner(&self, user: &User, resource_type: ResourceType, resource_id: &str) -> bool {
        (**self).is_owner(user, resource_type, resource_id)
    }
}
