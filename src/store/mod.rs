//! Content records and the repository interface the authorization layer
//! reads and writes through.
//!
//! [`AuthorDirectory`] is the synchronous, read-only slice the ownership
//! resolver needs. [`ContentStore`] is the async repository the gateway uses
//! for every gated mutation. [`MemoryStore`] implements both.

pub mod demo;
pub mod memory;

pub use memory::{MemoryStore, StoreState};

use crate::authz::{Permission, PermissionCatalog, PermissionKey, PermissionSet, Role};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A person who writes for the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub affiliation: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            affiliation: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleKind {
    BlogPost,
    JournalPaper,
}

/// A blog post or journal paper with an ordered author list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub kind: ArticleKind,
    #[serde(default)]
    pub author_ids: Vec<String>,
}

impl Article {
    pub fn new(title: impl Into<String>, kind: ArticleKind, author_ids: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            kind,
            author_ids,
        }
    }
}

/// Partial update of an article. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub kind: Option<ArticleKind>,
    pub author_ids: Option<Vec<String>>,
}

impl ArticleUpdate {
    pub fn apply(self, article: &mut Article) {
        if let Some(title) = self.title {
            article.title = title;
        }
        if let Some(kind) = self.kind {
            article.kind = kind;
        }
        if let Some(author_ids) = self.author_ids {
            article.author_ids = author_ids;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallForPapers {
    pub id: String,
    pub title: String,
    pub deadline: NaiveDate,
}

impl CallForPapers {
    pub fn new(title: impl Into<String>, deadline: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            deadline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// A stored user. The role is referenced by id and resolved on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub role_id: String,
    #[serde(default)]
    pub overrides: PermissionSet,
}

impl UserRecord {
    pub fn new(email: impl Into<String>, role_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            role_id: role_id.into(),
            overrides: PermissionSet::new(),
        }
    }
}

/// Read-only author lookups used for ownership resolution.
pub trait AuthorDirectory: Send + Sync {
    /// Author whose email matches `email`, which is already normalized.
    ///
    /// # Errors
    ///
    /// Backend failures only; a missing author is `Ok(None)`.
    fn author_by_email(&self, email: &str) -> Result<Option<Author>>;

    /// Author ids of an article, `Ok(None)` when the article does not exist.
    ///
    /// # Errors
    ///
    /// Backend failures only.
    fn article_author_ids(&self, article_id: &str) -> Result<Option<Vec<String>>>;
}

impl<D: AuthorDirectory + ?Sized> AuthorDirectory for Arc<D> {
    fn author_by_email(&self, email: &str) -> Result<Option<Author>> {
        (**self).author_by_email(email)
    }

    fn article_author_ids(&self, article_id: &str) -> Result<Option<Vec<String>>> {
        (**self).article_author_ids(article_id)
    }
}

/// Repository for every entity the gateway mutates.
///
/// Implementations do not authorize anything; the gateway checks before it
/// calls in. Mutations of unknown ids fail with
/// [`AuthzError::NotFound`](crate::error::AuthzError::NotFound).
///
/// Referential guards are the store's job and run atomically with the write:
/// a deletion that would leave dangling references fails with
/// [`AuthzError::AssignmentInUse`](crate::error::AuthzError::AssignmentInUse),
/// and a role or user granting a key the store does not hold fails with
/// [`AuthzError::UnknownPermissionReference`](crate::error::AuthzError::UnknownPermissionReference).
#[async_trait]
pub trait ContentStore: Send + Sync {
    // Articles
    async fn article(&self, id: &str) -> Result<Option<Article>>;
    async fn articles(&self) -> Result<Vec<Article>>;
    async fn insert_article(&self, article: Article) -> Result<Article>;
    async fn update_article(&self, id: &str, update: ArticleUpdate) -> Result<Article>;
    async fn delete_article(&self, id: &str) -> Result<()>;

    // Authors
    async fn author(&self, id: &str) -> Result<Option<Author>>;
    /// Rejects an email already used by another author.
    async fn insert_author(&self, author: Author) -> Result<Author>;
    async fn update_author(&self, author: Author) -> Result<Author>;
    /// Also removes the author from every article's author list.
    async fn delete_author(&self, id: &str) -> Result<()>;

    // Calls for papers and notifications
    async fn call_for_papers(&self, id: &str) -> Result<Option<CallForPapers>>;
    /// Insert a call for papers together with its announcement. Either both
    /// are stored or neither is.
    async fn insert_call_for_papers(
        &self,
        cfp: CallForPapers,
        notification: Notification,
    ) -> Result<(CallForPapers, Notification)>;
    async fn delete_call_for_papers(&self, id: &str) -> Result<()>;
    async fn notifications(&self) -> Result<Vec<Notification>>;

    // Permissions
    async fn permissions(&self) -> Result<PermissionCatalog>;
    async fn insert_permission(&self, permission: Permission) -> Result<Permission>;
    /// Refused while any role or user override grants `key`.
    async fn delete_permission(&self, key: &PermissionKey) -> Result<()>;
    /// Roles granting `key` plus users holding it as an override.
    async fn permission_assignments(&self, key: &PermissionKey) -> Result<usize>;

    // Roles
    async fn roles(&self) -> Result<Vec<Role>>;
    async fn role(&self, id: &str) -> Result<Option<Role>>;
    async fn role_by_name(&self, name: &str) -> Result<Option<Role>>;
    async fn insert_role(&self, role: Role) -> Result<Role>;
    async fn update_role(&self, role: Role) -> Result<Role>;
    /// Refused for system roles and roles any user holds.
    async fn delete_role(&self, id: &str) -> Result<()>;
    /// Users currently holding the role.
    async fn role_assignments(&self, role_id: &str) -> Result<usize>;

    // Users
    async fn user(&self, id: &str) -> Result<Option<UserRecord>>;
    /// Lookup by email, ASCII case-insensitive.
    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
    async fn users(&self) -> Result<Vec<UserRecord>>;
    async fn insert_user(&self, user: UserRecord) -> Result<UserRecord>;
    async fn update_user(&self, user: UserRecord) -> Result<UserRecord>;
    async fn delete_user(&self, id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_update_applies_only_set_fields() {
        let mut article = Article::new("Draft", ArticleKind::BlogPost, vec!["a1".into()]);
        ArticleUpdate {
            title: Some("Final".into()),
            ..Default::default()
        }
        .apply(&mut article);
        assert_eq!(article.title, "Final");
        assert_eq!(article.kind, ArticleKind::BlogPost);
        assert_eq!(article.author_ids, vec!["a1"]);
    }

    #[test]
    fn test_record_serde_is_camel_case() {
        let user = UserRecord::new("ada@example.org", "role-author");
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["roleId"], "role-author");
        assert_eq!(json["overrides"], serde_json::json!([]));

        let article = Article::new("On Types", ArticleKind::JournalPaper, vec![]);
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["kind"], "journal_paper");
        assert!(json.get("authorIds").is_some());
    }
}
