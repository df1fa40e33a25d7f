//! Test doubles and fixtures.
//!
//! - **Mocks**: an in-memory [`MockAuthorDirectory`] and a call-counting
//!   [`MockOwnershipResolver`], usable from doc tests and downstream crates
//! - **Fixtures**: a seeded on-disk journal with one user per role
//!   (test-only)
//!
//! ```rust
//! use journal_authz::authz::{check, Catalog, ResourceOwnershipContext, User};
//! use journal_authz::testing::MockOwnershipResolver;
//!
//! let catalog = Catalog::standard();
//! let author = User::new("u1", "ada@example.org", catalog.role("Author").cloned().unwrap());
//! let resolver = MockOwnershipResolver::owning(&["art-1"]);
//! let ctx = ResourceOwnershipContext::article("art-1");
//!
//! assert!(check(&catalog, &resolver, Some(&author), "article.UPDATE", Some(&ctx)).allowed);
//! ```

#[cfg(test)]
pub mod fixtures;
pub mod mocks;

#[cfg(test)]
pub use fixtures::*;
pub use mocks::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::decision::ResourceType;
    use crate::authz::role::default_roles;
    use crate::authz::{OwnershipResolver, User};
    use crate::store::AuthorDirectory;

    fn anyone() -> User {
        User::new("u1", "ada@example.org", default_roles().remove(0))
    }

    // =========================================================================
    // Mock Author Directory Tests
    // =========================================================================

    #[test]
    fn test_mock_directory_default_is_empty() {
        let directory = MockAuthorDirectory::default();
        assert!(directory.author_by_email("ada@example.org").unwrap().is_none());
        assert!(directory.article_author_ids("art-1").unwrap().is_none());
    }

    #[test]
    fn test_mock_directory_failure() {
        let directory = MockAuthorDirectory::new()
            .with_author("a1", "ada@example.org")
            .with_failure("timeout");
        let err = directory.author_by_email("ada@example.org").unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    // =========================================================================
    // Mock Ownership Resolver Tests
    // =========================================================================

    #[test]
    fn test_mock_resolver_counts_calls() {
        let resolver = MockOwnershipResolver::owning(&["art-1"]);
        assert!(resolver.is_owner(&anyone(), ResourceType::Article, "art-1"));
        assert!(!resolver.is_owner(&anyone(), ResourceType::Article, "art-2"));
        assert!(!resolver.is_owner(&anyone(), ResourceType::Author, "art-1"));
        assert_eq!(resolver.calls(), 3);
    }

    #[test]
    fn test_mock_resolver_owning_everything() {
        let resolver = MockOwnershipResolver::owning_everything();
        assert!(resolver.is_owner(&anyone(), ResourceType::User, "anything"));
    }

    // =========================================================================
    // Fixture Tests
    // =========================================================================

    #[tokio::test]
    async fn test_journal_fixture_resolves_every_role() {
        let journal = TestJournal::new().await;
        for email in [
            SUPER_ADMIN_EMAIL,
            ADMIN_EMAIL,
            EDITOR_EMAIL,
            AUTHOR_EMAIL,
            COAUTHOR_EMAIL,
            VIEWER_EMAIL,
        ] {
            let user = journal.user(email).await;
            assert_eq!(user.email, email);
        }
        assert!(journal.store.path().unwrap().exists());
    }
}
