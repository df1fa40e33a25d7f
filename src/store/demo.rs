//! Sample journal content for `init --demo` and the test fixtures.
//!
//! One user per system role, two authors and two articles:
//!
//! | article         | authors          |
//! |-----------------|------------------|
//! | `OWNED_ARTICLE` | grace, ada       |
//! | `OTHER_ARTICLE` | grace            |
//!
//! `AUTHOR_EMAIL` (ada) holds the Author role and is linked to author
//! record `auth-ada`.

use super::{Article, ArticleKind, Author, StoreState, UserRecord};
use crate::authz::role::{default_roles, ADMIN, AUTHOR, EDITOR, SUPER_ADMIN, VIEWER};
use crate::authz::{PermissionCatalog, Role};

pub const SUPER_ADMIN_EMAIL: &str = "root@journal.test";
pub const ADMIN_EMAIL: &str = "admin@journal.test";
pub const EDITOR_EMAIL: &str = "editor@journal.test";
pub const AUTHOR_EMAIL: &str = "ada@journal.test";
pub const COAUTHOR_EMAIL: &str = "grace@journal.test";
pub const VIEWER_EMAIL: &str = "viewer@journal.test";

pub const OWNED_ARTICLE: &str = "art-owned";
pub const OTHER_ARTICLE: &str = "art-other";

/// Standard catalog and system roles plus the sample content.
#[must_use]
pub fn demo_state() -> StoreState {
    with_demo_content(StoreState::seeded(
        &PermissionCatalog::standard(),
        default_roles(),
    ))
}

/// Add the sample users, authors and articles to `state`.
///
/// Users reference the `role-<name>` ids of the system roles.
#[must_use]
pub fn with_demo_content(mut state: StoreState) -> StoreState {
    let user = |email: &str, role: &str| UserRecord {
        id: format!("user-{}", email.split('@').next().unwrap_or(email)),
        email: email.to_string(),
        role_id: Role::system_id(role),
        overrides: Default::default(),
    };
    state.users.extend([
        user(SUPER_ADMIN_EMAIL, SUPER_ADMIN),
        user(ADMIN_EMAIL, ADMIN),
        user(EDITOR_EMAIL, EDITOR),
        user(AUTHOR_EMAIL, AUTHOR),
        user(COAUTHOR_EMAIL, AUTHOR),
        user(VIEWER_EMAIL, VIEWER),
    ]);

    let author = |id: &str, name: &str, email: &str| Author {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        affiliation: Some("University of Testing".to_string()),
    };
    state.authors.extend([
        author("auth-ada", "Ada Lovelace", AUTHOR_EMAIL),
        author("auth-grace", "Grace Hopper", COAUTHOR_EMAIL),
    ]);

    state.articles.extend([
        Article {
            id: OWNED_ARTICLE.to_string(),
            title: "Analytical Engines".to_string(),
            kind: ArticleKind::JournalPaper,
            author_ids: vec!["auth-grace".to_string(), "auth-ada".to_string()],
        },
        Article {
            id: OTHER_ARTICLE.to_string(),
            title: "Compilers for Everyone".to_string(),
            kind: ArticleKind::BlogPost,
            author_ids: vec!["auth-grace".to_string()],
        },
    ]);
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_users_reference_seeded_roles() {
        let state = demo_state();
        for user in &state.users {
            assert!(
                state.roles.iter().any(|r| r.id == user.role_id),
                "{} has no role",
                user.email
            );
        }
    }

    #[test]
    fn test_demo_articles_reference_authors() {
        let state = demo_state();
        for article in &state.articles {
            for id in &article.author_ids {
                assert!(state.authors.iter().any(|a| &a.id == id));
            }
        }
    }
}
