//! In-memory store with optional JSON snapshot persistence.
//!
//! All state lives behind one `RwLock`; every mutation runs under the write
//! lock and, when a snapshot path is set, rewrites the snapshot before the
//! lock is released. A failed write rolls the in-memory state back so memory
//! and disk never disagree.
//!
//! Snapshot writes are synchronous `std::fs` calls made from inside the async
//! trait methods. The write guard is a std lock and is never held across an
//! `.await`, so a mutation is one uninterrupted critical section: referential
//! guards, the snapshot write and the commit all happen under the same lock.
//! Callers on a latency-sensitive runtime should run the store on a blocking
//! thread.

use super::{
    Article, ArticleUpdate, Author, AuthorDirectory, CallForPapers, ContentStore, Notification,
    UserRecord,
};
use crate::authz::user::normalize_email;
use crate::authz::{Permission, PermissionCatalog, PermissionKey, PermissionSet, Role};
use crate::error::{AuthzError, IntoAuthzError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

/// Everything the store holds; also the snapshot file format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub calls_for_papers: Vec<CallForPapers>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl StoreState {
    /// State holding just a permission catalog and roles.
    pub fn seeded(permissions: &PermissionCatalog, roles: Vec<Role>) -> Self {
        Self {
            permissions: permissions.iter().cloned().collect(),
            roles,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    path: Option<PathBuf>,
}

impl MemoryStore {
    /// A store that lives only in memory.
    pub fn new(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
            path: None,
        }
    }

    /// Open the snapshot at `path`.
    ///
    /// # Errors
    ///
    /// [`AuthzError::MissingFile`] when the snapshot does not exist, or a
    /// store error when it cannot be parsed.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AuthzError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let state: StoreState = serde_json::from_str(&content)
            .map_err(|e| AuthzError::store(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), users = state.users.len(), "store opened");
        Ok(Self {
            state: RwLock::new(state),
            path: Some(path.to_path_buf()),
        })
    }

    /// Create a new snapshot at `path` holding `state`.
    ///
    /// # Errors
    ///
    /// Store error when the snapshot cannot be written.
    pub fn create(path: &Path, state: StoreState) -> Result<Self> {
        let store = Self {
            state: RwLock::new(state),
            path: Some(path.to_path_buf()),
        };
        store.persist(&store.read())?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Clone of the full state.
    pub fn snapshot(&self) -> StoreState {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &StoreState) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).into_authz_store()?;
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).into_authz_store()?;
        std::fs::rename(&tmp, path).into_authz_store()
    }

    /// Apply `f` under the write lock and persist. On any error the state is
    /// left as it was.
    fn mutate<T>(&self, f: impl FnOnce(&mut StoreState) -> Result<T>) -> Result<T> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        let value = f(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(value)
    }
}

fn position<T>(items: &[T], entity: &str, id: &str, matches: impl Fn(&T) -> bool) -> Result<usize> {
    items
        .iter()
        .position(matches)
        .ok_or_else(|| AuthzError::not_found(entity, id))
}

/// Each email links to at most one author record.
fn ensure_author_email_free(state: &StoreState, author: &Author) -> Result<()> {
    let email = normalize_email(&author.email);
    if state
        .authors
        .iter()
        .any(|a| a.id != author.id && normalize_email(&a.email) == email)
    {
        return Err(AuthzError::DuplicateAuthor {
            email: author.email.clone(),
        });
    }
    Ok(())
}

/// Fails when any role or user override still grants `key`.
fn ensure_permission_unassigned(state: &StoreState, key: &PermissionKey) -> Result<()> {
    let total_assignments = permission_assignments(state, key);
    if total_assignments > 0 {
        return Err(AuthzError::AssignmentInUse {
            entity: "permission".to_string(),
            id: key.to_string(),
            total_assignments,
        });
    }
    Ok(())
}

fn permission_assignments(state: &StoreState, key: &PermissionKey) -> usize {
    let roles = state
        .roles
        .iter()
        .filter(|r| r.permissions.contains(key))
        .count();
    let users = state
        .users
        .iter()
        .filter(|u| u.overrides.contains(key))
        .count();
    roles + users
}

/// Every granted key must exist in the stored permission list.
fn ensure_keys_known(state: &StoreState, owner: &str, keys: &PermissionSet) -> Result<()> {
    match keys
        .iter()
        .find(|k| !state.permissions.iter().any(|p| &p.key == *k))
    {
        Some(key) => Err(AuthzError::UnknownPermissionReference {
            owner: owner.to_string(),
            key: key.to_string(),
        }),
        None => Ok(()),
    }
}

impl AuthorDirectory for MemoryStore {
    fn author_by_email(&self, email: &str) -> Result<Option<Author>> {
        Ok(self
            .read()
            .authors
            .iter()
            .find(|a| normalize_email(&a.email) == email)
            .cloned())
    }

    fn article_author_ids(&self, article_id: &str) -> Result<Option<Vec<String>>> {
        Ok(self
            .read()
            .articles
            .iter()
            .find(|a| a.id == article_id)
            .map(|a| a.author_ids.clone()))
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn article(&self, id: &str) -> Result<Option<Article>> {
        Ok(self.read().articles.iter().find(|a| a.id == id).cloned())
    }

    async fn articles(&self) -> Result<Vec<Article>> {
        Ok(self.read().articles.clone())
    }

    async fn insert_article(&self, article: Article) -> Result<Article> {
        self.mutate(|s| {
            for author_id in &article.author_ids {
                if !s.authors.iter().any(|a| &a.id == author_id) {
                    return Err(AuthzError::not_found("author", author_id.clone()));
                }
            }
            s.articles.push(article.clone());
            Ok(article)
        })
    }

    async fn update_article(&self, id: &str, update: ArticleUpdate) -> Result<Article> {
        self.mutate(|s| {
            if let Some(ids) = &update.author_ids {
                for author_id in ids {
                    if !s.authors.iter().any(|a| &a.id == author_id) {
                        return Err(AuthzError::not_found("author", author_id.clone()));
                    }
                }
            }
            let idx = position(&s.articles, "article", id, |a| a.id == id)?;
            update.apply(&mut s.articles[idx]);
            Ok(s.articles[idx].clone())
        })
    }

    async fn delete_article(&self, id: &str) -> Result<()> {
        self.mutate(|s| {
            let idx = position(&s.articles, "article", id, |a| a.id == id)?;
            s.articles.remove(idx);
            Ok(())
        })
    }

    async fn author(&self, id: &str) -> Result<Option<Author>> {
        Ok(self.read().authors.iter().find(|a| a.id == id).cloned())
    }

    async fn insert_author(&self, author: Author) -> Result<Author> {
        self.mutate(|s| {
            ensure_author_email_free(s, &author)?;
            s.authors.push(author.clone());
            Ok(author)
        })
    }

    async fn update_author(&self, author: Author) -> Result<Author> {
        self.mutate(|s| {
            let idx = position(&s.authors, "author", &author.id, |a| a.id == author.id)?;
            ensure_author_email_free(s, &author)?;
            s.authors[idx] = author.clone();
            Ok(author)
        })
    }

    async fn delete_author(&self, id: &str) -> Result<()> {
        self.mutate(|s| {
            let idx = position(&s.authors, "author", id, |a| a.id == id)?;
            s.authors.remove(idx);
            for article in &mut s.articles {
                article.author_ids.retain(|a| a != id);
            }
            Ok(())
        })
    }

    async fn call_for_papers(&self, id: &str) -> Result<Option<CallForPapers>> {
        Ok(self
            .read()
            .calls_for_papers
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn insert_call_for_papers(
        &self,
        cfp: CallForPapers,
        notification: Notification,
    ) -> Result<(CallForPapers, Notification)> {
        self.mutate(|s| {
            s.calls_for_papers.push(cfp.clone());
            s.notifications.push(notification.clone());
            Ok((cfp, notification))
        })
    }

    async fn delete_call_for_papers(&self, id: &str) -> Result<()> {
        self.mutate(|s| {
            let idx = position(&s.calls_for_papers, "call for papers", id, |c| c.id == id)?;
            s.calls_for_papers.remove(idx);
            Ok(())
        })
    }

    async fn notifications(&self) -> Result<Vec<Notification>> {
        Ok(self.read().notifications.clone())
    }

    async fn permissions(&self) -> Result<PermissionCatalog> {
        Ok(self.read().permissions.iter().cloned().collect())
    }

    async fn insert_permission(&self, permission: Permission) -> Result<Permission> {
        self.mutate(|s| {
            if s.permissions.iter().any(|p| p.key == permission.key) {
                return Err(AuthzError::DuplicatePermission {
                    key: permission.key.to_string(),
                });
            }
            s.permissions.push(permission.clone());
            Ok(permission)
        })
    }

    async fn delete_permission(&self, key: &PermissionKey) -> Result<()> {
        self.mutate(|s| {
            let idx = position(&s.permissions, "permission", key.as_str(), |p| &p.key == key)?;
            ensure_permission_unassigned(s, key)?;
            s.permissions.remove(idx);
            Ok(())
        })
    }

    async fn permission_assignments(&self, key: &PermissionKey) -> Result<usize> {
        Ok(permission_assignments(&self.read(), key))
    }

    async fn roles(&self) -> Result<Vec<Role>> {
        Ok(self.read().roles.clone())
    }

    async fn role(&self, id: &str) -> Result<Option<Role>> {
        Ok(self.read().roles.iter().find(|r| r.id == id).cloned())
    }

    async fn role_by_name(&self, name: &str) -> Result<Option<Role>> {
        Ok(self.read().roles.iter().find(|r| r.name == name).cloned())
    }

    async fn insert_role(&self, role: Role) -> Result<Role> {
        self.mutate(|s| {
            if s.roles.iter().any(|r| r.name == role.name) {
                return Err(AuthzError::DuplicateRole {
                    name: role.name.clone(),
                });
            }
            ensure_keys_known(s, &format!("role '{}'", role.name), &role.permissions)?;
            s.roles.push(role.clone());
            Ok(role)
        })
    }

    async fn update_role(&self, role: Role) -> Result<Role> {
        self.mutate(|s| {
            if s.roles.iter().any(|r| r.name == role.name && r.id != role.id) {
                return Err(AuthzError::DuplicateRole {
                    name: role.name.clone(),
                });
            }
            let idx = position(&s.roles, "role", &role.id, |r| r.id == role.id)?;
            ensure_keys_known(s, &format!("role '{}'", role.name), &role.permissions)?;
            s.roles[idx] = role.clone();
            Ok(role)
        })
    }

    async fn delete_role(&self, id: &str) -> Result<()> {
        self.mutate(|s| {
            let idx = position(&s.roles, "role", id, |r| r.id == id)?;
            let role = &s.roles[idx];
            if role.is_system {
                return Err(AuthzError::SystemRoleProtected {
                    name: role.name.clone(),
                });
            }
            let total_assignments = s.users.iter().filter(|u| u.role_id == id).count();
            if total_assignments > 0 {
                return Err(AuthzError::AssignmentInUse {
                    entity: "role".to_string(),
                    id: role.name.clone(),
                    total_assignments,
                });
            }
            s.roles.remove(idx);
            Ok(())
        })
    }

    async fn role_assignments(&self, role_id: &str) -> Result<usize> {
        Ok(self
            .read()
            .users
            .iter()
            .filter(|u| u.role_id == role_id)
            .count())
    }

    async fn user(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(self.read().users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let email = normalize_email(email);
        Ok(self
            .read()
            .users
            .iter()
            .find(|u| normalize_email(&u.email) == email)
            .cloned())
    }

    async fn users(&self) -> Result<Vec<UserRecord>> {
        Ok(self.read().users.clone())
    }

    async fn insert_user(&self, user: UserRecord) -> Result<UserRecord> {
        self.mutate(|s| {
            if !s.roles.iter().any(|r| r.id == user.role_id) {
                return Err(AuthzError::not_found("role", user.role_id.clone()));
            }
            let email = normalize_email(&user.email);
            if s.users.iter().any(|u| normalize_email(&u.email) == email) {
                return Err(AuthzError::DuplicateUser {
                    email: user.email.clone(),
                });
            }
            ensure_keys_known(s, &format!("user '{}'", user.email), &user.overrides)?;
            s.users.push(user.clone());
            Ok(user)
        })
    }

    async fn update_user(&self, user: UserRecord) -> Result<UserRecord> {
        self.mutate(|s| {
            if !s.roles.iter().any(|r| r.id == user.role_id) {
                return Err(AuthzError::not_found("role", user.role_id.clone()));
            }
            let idx = position(&s.users, "user", &user.id, |u| u.id == user.id)?;
            ensure_keys_known(s, &format!("user '{}'", user.email), &user.overrides)?;
            s.users[idx] = user.clone();
            Ok(user)
        })
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        self.mutate(|s| {
            let idx = position(&s.users, "user", id, |u| u.id == id)?;
            s.users.remove(idx);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::role::{default_roles, AUTHOR, VIEWER};
    use crate::store::ArticleKind;
    use tempfile::TempDir;

    fn seeded() -> MemoryStore {
        MemoryStore::new(StoreState::seeded(
            &PermissionCatalog::standard(),
            default_roles(),
        ))
    }

    fn key(s: &str) -> PermissionKey {
        PermissionKey::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_article_crud() {
        let store = seeded();
        let author = store
            .insert_author(Author::new("Ada", "ada@example.org"))
            .await
            .unwrap();
        let article = store
            .insert_article(Article::new("Notes", ArticleKind::BlogPost, vec![author.id.clone()]))
            .await
            .unwrap();

        let updated = store
            .update_article(
                &article.id,
                ArticleUpdate {
                    title: Some("Better notes".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Better notes");

        store.delete_article(&article.id).await.unwrap();
        assert!(store.article(&article.id).await.unwrap().is_none());
        let err = store.delete_article(&article.id).await.unwrap_err();
        assert!(matches!(err, AuthzError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_article_requires_known_authors() {
        let store = seeded();
        let err = store
            .insert_article(Article::new("Orphan", ArticleKind::BlogPost, vec!["ghost".into()]))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::NotFound { .. }));
        assert!(store.articles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_author_unlinks_articles() {
        let store = seeded();
        let a = store.insert_author(Author::new("A", "a@x.org")).await.unwrap();
        let b = store.insert_author(Author::new("B", "b@x.org")).await.unwrap();
        let article = store
            .insert_article(Article::new("T", ArticleKind::JournalPaper, vec![a.id.clone(), b.id.clone()]))
            .await
            .unwrap();

        store.delete_author(&a.id).await.unwrap();
        assert_eq!(
            store.article_author_ids(&article.id).unwrap(),
            Some(vec![b.id.clone()])
        );
    }

    #[tokio::test]
    async fn test_author_directory_matches_normalized_email() {
        let store = seeded();
        store
            .insert_author(Author::new("Ada", "Ada@Example.org"))
            .await
            .unwrap();
        assert!(store.author_by_email("ada@example.org").unwrap().is_some());
        assert!(store.author_by_email("bob@example.org").unwrap().is_none());
        assert_eq!(store.article_author_ids("missing").unwrap(), None);
    }

    #[tokio::test]
    async fn test_call_for_papers_with_notification() {
        let store = seeded();
        let deadline = chrono::NaiveDate::from_ymd_opt(2027, 3, 1).unwrap();
        let (cfp, note) = store
            .insert_call_for_papers(
                CallForPapers::new("Spring issue", deadline),
                Notification::new("New call for papers", "Spring issue is open"),
            )
            .await
            .unwrap();
        assert_eq!(store.call_for_papers(&cfp.id).await.unwrap(), Some(cfp));
        assert_eq!(store.notifications().await.unwrap(), vec![note]);
    }

    #[tokio::test]
    async fn test_assignment_counts() {
        let store = seeded();
        let author_role = store.role_by_name(AUTHOR).await.unwrap().unwrap();
        let mut user = UserRecord::new("ada@example.org", author_role.id.clone());
        user.overrides.add(key("permission.DELETE"));
        store.insert_user(user).await.unwrap();

        assert_eq!(store.role_assignments(&author_role.id).await.unwrap(), 1);
        // Super Admin role plus the override.
        assert_eq!(
            store.permission_assignments(&key("permission.DELETE")).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_duplicates_rejected() {
        let store = seeded();
        let err = store
            .insert_permission(Permission::new(key("article.READ"), "dup"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::DuplicatePermission { .. }));

        let err = store.insert_role(default_roles().remove(0)).await.unwrap_err();
        assert!(matches!(err, AuthzError::DuplicateRole { .. }));

        let role_id = Role::system_id(AUTHOR);
        store
            .insert_user(UserRecord::new("ada@example.org", role_id.clone()))
            .await
            .unwrap();
        let err = store
            .insert_user(UserRecord::new("ADA@example.org", role_id))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::DuplicateUser { .. }));
    }

    #[tokio::test]
    async fn test_author_email_must_be_unique() {
        let store = seeded();
        let ada = store
            .insert_author(Author::new("Ada", "ada@example.org"))
            .await
            .unwrap();
        let err = store
            .insert_author(Author::new("Ada Lovelace", " ADA@example.org "))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::DuplicateAuthor { .. }));
        assert!(err.is_client_error());

        let bob = store
            .insert_author(Author::new("Bob", "bob@example.org"))
            .await
            .unwrap();
        let err = store
            .update_author(Author {
                email: "Ada@Example.org".to_string(),
                ..bob.clone()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::DuplicateAuthor { .. }));

        // Keeping your own email is not a clash.
        let renamed = Author {
            name: "Ada King".to_string(),
            ..ada
        };
        assert!(store.update_author(renamed).await.is_ok());
        assert_eq!(store.snapshot().authors.len(), 2);
    }

    // =========================================================================
    // Referential guards
    // =========================================================================

    #[tokio::test]
    async fn test_delete_permission_refused_while_granted() {
        let store = seeded();
        let archive = key("article.ARCHIVE");
        store
            .insert_permission(Permission::new(archive.clone(), "archive articles"))
            .await
            .unwrap();

        // A grant that lands after a caller saw zero assignments.
        let mut viewer = store.role(&Role::system_id(VIEWER)).await.unwrap().unwrap();
        viewer.permissions.add(archive.clone());
        store.update_role(viewer).await.unwrap();

        let err = store.delete_permission(&archive).await.unwrap_err();
        assert!(matches!(
            err,
            AuthzError::AssignmentInUse {
                total_assignments: 1,
                ..
            }
        ));
        assert!(store.permissions().await.unwrap().contains(&archive));
    }

    #[tokio::test]
    async fn test_delete_permission_refused_while_overridden() {
        let store = seeded();
        let archive = key("article.ARCHIVE");
        store
            .insert_permission(Permission::new(archive.clone(), ""))
            .await
            .unwrap();
        let mut user = UserRecord::new("ada@example.org", Role::system_id(AUTHOR));
        user.overrides.add(archive.clone());
        store.insert_user(user).await.unwrap();

        let err = store.delete_permission(&archive).await.unwrap_err();
        assert!(matches!(err, AuthzError::AssignmentInUse { .. }));
    }

    #[tokio::test]
    async fn test_grants_must_reference_stored_permissions() {
        let store = seeded();
        let mut viewer = store.role(&Role::system_id(VIEWER)).await.unwrap().unwrap();
        viewer.permissions.add(key("article.PUBLISH"));
        let err = store.update_role(viewer).await.unwrap_err();
        assert!(matches!(err, AuthzError::UnknownPermissionReference { .. }));

        let mut user = UserRecord::new("ada@example.org", Role::system_id(AUTHOR));
        user.overrides.add(key("article.PUBLISH"));
        let err = store.insert_user(user).await.unwrap_err();
        assert!(err.to_string().contains("article.PUBLISH"));
    }

    #[tokio::test]
    async fn test_delete_role_guards() {
        let store = seeded();
        let err = store.delete_role(&Role::system_id(AUTHOR)).await.unwrap_err();
        assert!(matches!(err, AuthzError::SystemRoleProtected { .. }));

        let reviewer = store
            .insert_role(crate::authz::RoleBuilder::new("Reviewer").build().unwrap())
            .await
            .unwrap();
        let user = store
            .insert_user(UserRecord::new("rev@example.org", reviewer.id.clone()))
            .await
            .unwrap();
        let err = store.delete_role(&reviewer.id).await.unwrap_err();
        assert!(matches!(err, AuthzError::AssignmentInUse { .. }));

        store.delete_user(&user.id).await.unwrap();
        store.delete_role(&reviewer.id).await.unwrap();
        assert!(store.role(&reviewer.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_requires_existing_role() {
        let store = seeded();
        let err = store
            .insert_user(UserRecord::new("ada@example.org", "role-nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::NotFound { .. }));
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".journal/store.json");
        let store = MemoryStore::create(
            &path,
            StoreState::seeded(&PermissionCatalog::standard(), default_roles()),
        )
        .unwrap();
        store
            .insert_author(Author::new("Ada", "ada@example.org"))
            .await
            .unwrap();

        let reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(reopened.snapshot(), store.snapshot());
        assert_eq!(reopened.path(), Some(path.as_path()));
    }

    #[test]
    fn test_open_missing_snapshot() {
        let temp = TempDir::new().unwrap();
        let err = MemoryStore::open(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, AuthzError::MissingFile { .. }));
    }

    #[test]
    fn test_open_corrupt_snapshot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let err = MemoryStore::open(&path).unwrap_err();
        assert!(matches!(err, AuthzError::Store { .. }));
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_state_untouched() {
        let store = seeded();
        let before = store.snapshot();
        assert!(store.delete_role("role-missing").await.is_err());
        assert_eq!(store.snapshot(), before);
    }
}
