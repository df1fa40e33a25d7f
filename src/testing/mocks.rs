//! Controllable test doubles for the ownership seams.

use crate::authz::decision::ResourceType;
use crate::authz::user::normalize_email;
use crate::authz::{OwnershipResolver, User};
use crate::error::{AuthzError, Result};
use crate::store::{Author, AuthorDirectory};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

/// In-memory author directory.
///
/// # Example
///
/// ```rust
/// use journal_authz::store::AuthorDirectory;
/// use journal_authz::testing::MockAuthorDirectory;
///
/// let directory = MockAuthorDirectory::new()
///     .with_author("auth-1", "ada@example.org")
///     .with_article("art-1", &["auth-1"]);
///
/// assert!(directory.author_by_email("ada@example.org").unwrap().is_some());
/// assert_eq!(
///     directory.article_author_ids("art-1").unwrap(),
///     Some(vec!["auth-1".to_string()])
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockAuthorDirectory {
    authors: Vec<Author>,
    articles: HashMap<String, Vec<String>>,
    failure: Option<String>,
}

impl MockAuthorDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an author record.
    #[must_use]
    pub fn with_author(mut self, id: &str, email: &str) -> Self {
        self.authors.push(Author {
            id: id.to_string(),
            name: id.to_string(),
            email: email.to_string(),
            affiliation: None,
        });
        self
    }

    /// Add an article with the given ordered author ids.
    #[must_use]
    pub fn with_article(mut self, id: &str, author_ids: &[&str]) -> Self {
        self.articles.insert(
            id.to_string(),
            author_ids.iter().map(|a| a.to_string()).collect(),
        );
        self
    }

    /// Make every lookup fail with a store error.
    #[must_use]
    pub fn with_failure(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    fn fail_if_configured(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(AuthzError::store(message.clone())),
            None => Ok(()),
        }
    }
}

impl AuthorDirectory for MockAuthorDirectory {
    fn author_by_email(&self, email: &str) -> Result<Option<Author>> {
        self.fail_if_configured()?;
        Ok(self
            .authors
            .iter()
            .find(|a| normalize_email(&a.email) == email)
            .cloned())
    }

    fn article_author_ids(&self, article_id: &str) -> Result<Option<Vec<String>>> {
        self.fail_if_configured()?;
        Ok(self.articles.get(article_id).cloned())
    }
}

/// Ownership resolver with a fixed answer per article id. Counts calls.
#[derive(Debug, Default)]
pub struct MockOwnershipResolver {
    owned: HashSet<String>,
    owns_everything: bool,
    calls: AtomicU32,
}

impl MockOwnershipResolver {
    /// Resolver that reports ownership of exactly these article ids.
    #[must_use]
    pub fn owning(ids: &[&str]) -> Self {
        Self {
            owned: ids.iter().map(|id| id.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Resolver that claims ownership of every resource of every type.
    #[must_use]
    pub fn owning_everything() -> Self {
        Self {
            owns_everything: true,
            ..Self::default()
        }
    }

    /// Number of `is_owner` calls so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OwnershipResolver for MockOwnershipResolver {
    fn is_owner(&self, _user: &User, resource_type: ResourceType, resource_id: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.owns_everything
            || (resource_type == ResourceType::Article && self.owned.contains(resource_id))
    }
}
