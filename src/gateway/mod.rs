//! The action gateway.
//!
//! Every admin mutation goes through an [`ActionGateway`] method. Each method
//! authorizes strictly before it touches the store. On denial or failure it
//! returns an [`ActionResponse`] with `success: false` instead of mutating.
//! Unexpected errors are logged and replaced by [`UNEXPECTED_ERROR`]. Every
//! call is recorded in the audit trail when one is attached.
//!
//! Ordering inside a method:
//!
//! 1. the actor must be authenticated
//! 2. for ownership-scoped actions the resource must exist (reported as not
//!    found before ownership is resolved)
//! 3. the permission check
//! 4. action-specific guards (role-assignment rank, deletion guards, key
//!    validation)
//! 5. the store mutation, then a catalog reload for role/permission changes

pub mod response;

pub use response::{ActionResponse, UNEXPECTED_ERROR};

use crate::audit::{AuditLogger, AuditOutcome};
use crate::authz::{
    Catalog, CatalogCache, Decision, DecisionBasis, DirectoryOwnershipResolver, Permission,
    PermissionChecker, PermissionKey, PermissionSet, ResourceOwnershipContext, Role, RoleBuilder,
    User,
};
use crate::config::AuthzConfig;
use crate::error::{AuthzError, Result};
use crate::store::{
    Article, ArticleUpdate, Author, AuthorDirectory, CallForPapers, ContentStore, Notification,
    UserRecord,
};
use chrono::NaiveDate;
use std::sync::{Arc, Mutex, PoisonError};

/// Why a gated action did not complete.
#[derive(Debug)]
enum Rejection {
    /// The checker or a rank rule said no.
    Denied(Decision),
    /// The request itself is unusable (e.g. a malformed key typed by an admin).
    Invalid(String),
    Failed(AuthzError),
}

impl From<AuthzError> for Rejection {
    fn from(e: AuthzError) -> Self {
        Self::Failed(e)
    }
}

type Step<T> = std::result::Result<T, Rejection>;

/// One gateway call, as it appears in logs and the audit trail.
#[derive(Debug)]
struct Action<'a> {
    name: &'static str,
    permission: &'static str,
    actor: Option<&'a User>,
    resource_id: Option<String>,
}

impl<'a> Action<'a> {
    fn new(name: &'static str, permission: &'static str, actor: Option<&'a User>) -> Self {
        Self {
            name,
            permission,
            actor,
            resource_id: None,
        }
    }

    fn on(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    fn actor_label(&self) -> &str {
        self.actor.map(|u| u.email.as_str()).unwrap_or("anonymous")
    }
}

/// Gatekeeper in front of a [`ContentStore`].
pub struct ActionGateway<S> {
    store: Arc<S>,
    checker: PermissionChecker<DirectoryOwnershipResolver<Arc<S>>>,
    audit: Option<Mutex<AuditLogger>>,
}

impl<S> std::fmt::Debug for ActionGateway<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionGateway")
            .field("catalog_generation", &self.checker.cache().generation())
            .field("audit", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}

impl<S> ActionGateway<S>
where
    S: ContentStore + AuthorDirectory + 'static,
{
    pub fn new(store: Arc<S>, cache: Arc<CatalogCache>) -> Self {
        let resolver = DirectoryOwnershipResolver::new(Arc::clone(&store));
        Self {
            store,
            checker: PermissionChecker::new(cache, resolver),
            audit: None,
        }
    }

    /// Build the catalog from the store's permissions and roles, with the
    /// hierarchy and ownership allow-list from `config`.
    ///
    /// # Errors
    ///
    /// Store failures, or a stored model that fails catalog validation.
    pub async fn open(store: Arc<S>, config: &AuthzConfig) -> Result<Self> {
        let catalog = config.stored_catalog(store.permissions().await?, store.roles().await?)?;
        Ok(Self::new(store, Arc::new(CatalogCache::new(catalog))))
    }

    #[must_use]
    pub fn with_audit(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(Mutex::new(logger));
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn checker(&self) -> &PermissionChecker<DirectoryOwnershipResolver<Arc<S>>> {
        &self.checker
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.checker.catalog()
    }

    /// Turn a stored user into an authorization subject.
    ///
    /// # Errors
    ///
    /// A store error when the user's role id does not resolve; a user never
    /// exists without a role.
    pub async fn resolve_user(&self, email: &str) -> Result<Option<User>> {
        let Some(record) = self.store.user_by_email(email).await? else {
            return Ok(None);
        };
        let role = self
            .catalog()
            .role_by_id(&record.role_id)
            .cloned()
            .ok_or_else(|| {
                AuthzError::store(format!(
                    "user '{}' references missing role '{}'",
                    record.email, record.role_id
                ))
            })?;
        Ok(Some(User {
            id: record.id,
            email: record.email,
            role,
            overrides: record.overrides,
        }))
    }

    // =========================================================================
    // Articles
    // =========================================================================

    pub async fn create_article(&self, actor: Option<&User>, article: Article) -> ActionResponse<Article> {
        let action = Action::new("article.create", "article.CREATE", actor).on(article.id.clone());
        let result = self.do_create_article(&action, article).await;
        self.finish(action, result)
    }

    async fn do_create_article(&self, action: &Action<'_>, article: Article) -> Step<Article> {
        self.authorize(action, None)?;
        Ok(self.store.insert_article(article).await?)
    }

    /// Update an article. Listed authors may update their own articles
    /// without `article.UPDATE`.
    pub async fn update_article(
        &self,
        actor: Option<&User>,
        id: &str,
        update: ArticleUpdate,
    ) -> ActionResponse<Article> {
        let action = Action::new("article.update", "article.UPDATE", actor).on(id);
        let result = self.do_update_article(&action, id, update).await;
        self.finish(action, result)
    }

    async fn do_update_article(&self, action: &Action<'_>, id: &str, update: ArticleUpdate) -> Step<Article> {
        self.require_authenticated(action)?;
        if self.store.article(id).await?.is_none() {
            return Err(AuthzError::not_found("article", id).into());
        }
        self.authorize(action, Some(&ResourceOwnershipContext::article(id)))?;
        Ok(self.store.update_article(id, update).await?)
    }

    /// Delete an article. Listed authors may delete their own articles.
    pub async fn delete_article(&self, actor: Option<&User>, id: &str) -> ActionResponse<String> {
        let action = Action::new("article.delete", "article.DELETE", actor).on(id);
        let result = self.do_delete_article(&action, id).await;
        self.finish(action, result)
    }

    async fn do_delete_article(&self, action: &Action<'_>, id: &str) -> Step<String> {
        self.require_authenticated(action)?;
        if self.store.article(id).await?.is_none() {
            return Err(AuthzError::not_found("article", id).into());
        }
        self.authorize(action, Some(&ResourceOwnershipContext::article(id)))?;
        self.store.delete_article(id).await?;
        Ok(id.to_string())
    }

    // =========================================================================
    // Authors
    // =========================================================================

    pub async fn create_author(&self, actor: Option<&User>, author: Author) -> ActionResponse<Author> {
        let action = Action::new("author.create", "author.CREATE", actor).on(author.id.clone());
        let result = self.do_create_author(&action, author).await;
        self.finish(action, result)
    }

    async fn do_create_author(&self, action: &Action<'_>, author: Author) -> Step<Author> {
        self.authorize(action, None)?;
        Ok(self.store.insert_author(author).await?)
    }

    pub async fn update_author(&self, actor: Option<&User>, author: Author) -> ActionResponse<Author> {
        let action = Action::new("author.update", "author.UPDATE", actor).on(author.id.clone());
        let result = self.do_update_author(&action, author).await;
        self.finish(action, result)
    }

    async fn do_update_author(&self, action: &Action<'_>, author: Author) -> Step<Author> {
        self.authorize(action, None)?;
        Ok(self.store.update_author(author).await?)
    }

    pub async fn delete_author(&self, actor: Option<&User>, id: &str) -> ActionResponse<String> {
        let action = Action::new("author.delete", "author.DELETE", actor).on(id);
        let result = self.do_delete_author(&action, id).await;
        self.finish(action, result)
    }

    async fn do_delete_author(&self, action: &Action<'_>, id: &str) -> Step<String> {
        self.authorize(action, None)?;
        self.store.delete_author(id).await?;
        Ok(id.to_string())
    }

    // =========================================================================
    // Calls for papers
    // =========================================================================

    /// Create a call for papers and its announcement notification together.
    pub async fn create_call_for_papers(
        &self,
        actor: Option<&User>,
        title: &str,
        deadline: NaiveDate,
    ) -> ActionResponse<CallForPapers> {
        let action = Action::new("callforpapers.create", "callforpapers.CREATE", actor);
        let result = self.do_create_call_for_papers(&action, title, deadline).await;
        self.finish(action, result)
    }

    async fn do_create_call_for_papers(
        &self,
        action: &Action<'_>,
        title: &str,
        deadline: NaiveDate,
    ) -> Step<CallForPapers> {
        self.authorize(action, None)?;
        let cfp = CallForPapers::new(title, deadline);
        let notification = Notification::new(
            "New call for papers",
            format!("{} is open for submissions until {}", title, deadline),
        );
        let (cfp, _) = self.store.insert_call_for_papers(cfp, notification).await?;
        Ok(cfp)
    }

    pub async fn delete_call_for_papers(&self, actor: Option<&User>, id: &str) -> ActionResponse<String> {
        let action = Action::new("callforpapers.delete", "callforpapers.DELETE", actor).on(id);
        let result = self.do_delete_call_for_papers(&action, id).await;
        self.finish(action, result)
    }

    async fn do_delete_call_for_papers(&self, action: &Action<'_>, id: &str) -> Step<String> {
        self.authorize(action, None)?;
        self.store.delete_call_for_papers(id).await?;
        Ok(id.to_string())
    }

    // =========================================================================
    // Permissions
    // =========================================================================

    pub async fn create_permission(
        &self,
        actor: Option<&User>,
        key: &str,
        description: &str,
    ) -> ActionResponse<Permission> {
        let action = Action::new("permission.create", "permission.CREATE", actor).on(key);
        let result = self.do_create_permission(&action, key, description).await;
        self.finish(action, result)
    }

    async fn do_create_permission(&self, action: &Action<'_>, key: &str, description: &str) -> Step<Permission> {
        self.authorize(action, None)?;
        let key = parse_input_key(key)?;
        let permission = self
            .store
            .insert_permission(Permission::new(key, description))
            .await?;
        self.refresh_catalog().await?;
        Ok(permission)
    }

    /// Delete a permission. Rejected while any role or user override still
    /// references it.
    pub async fn delete_permission(&self, actor: Option<&User>, key: &str) -> ActionResponse<String> {
        let action = Action::new("permission.delete", "permission.DELETE", actor).on(key);
        let result = self.do_delete_permission(&action, key).await;
        self.finish(action, result)
    }

    async fn do_delete_permission(&self, action: &Action<'_>, key: &str) -> Step<String> {
        self.authorize(action, None)?;
        let key = parse_input_key(key)?;
        if !self.store.permissions().await?.contains(&key) {
            return Err(AuthzError::not_found("permission", key.as_str()).into());
        }
        let total_assignments = self.store.permission_assignments(&key).await?;
        if total_assignments > 0 {
            return Err(AuthzError::AssignmentInUse {
                entity: "permission".to_string(),
                id: key.to_string(),
                total_assignments,
            }
            .into());
        }
        self.store.delete_permission(&key).await?;
        self.refresh_catalog().await?;
        Ok(key.to_string())
    }

    // =========================================================================
    // Roles
    // =========================================================================

    pub async fn create_role(
        &self,
        actor: Option<&User>,
        name: &str,
        description: Option<&str>,
        permissions: PermissionSet,
    ) -> ActionResponse<Role> {
        let action = Action::new("role.create", "role.CREATE", actor).on(name);
        let result = self.do_create_role(&action, name, description, permissions).await;
        self.finish(action, result)
    }

    async fn do_create_role(
        &self,
        action: &Action<'_>,
        name: &str,
        description: Option<&str>,
        permissions: PermissionSet,
    ) -> Step<Role> {
        self.authorize(action, None)?;
        self.catalog()
            .validate_overrides(&format!("role '{}'", name), &permissions)?;

        let mut builder = RoleBuilder::new(name).with_permissions(permissions.iter().cloned());
        if let Some(description) = description {
            builder = builder.description(description);
        }
        let role = self.store.insert_role(builder.build()?).await?;
        self.refresh_catalog().await?;
        Ok(role)
    }

    /// Replace the permission grants of a role.
    pub async fn update_role_permissions(
        &self,
        actor: Option<&User>,
        name: &str,
        permissions: PermissionSet,
    ) -> ActionResponse<Role> {
        let action = Action::new("role.update", "role.UPDATE", actor).on(name);
        let result = self.do_update_role_permissions(&action, name, permissions).await;
        self.finish(action, result)
    }

    async fn do_update_role_permissions(
        &self,
        action: &Action<'_>,
        name: &str,
        permissions: PermissionSet,
    ) -> Step<Role> {
        self.authorize(action, None)?;
        let mut role = self
            .store
            .role_by_name(name)
            .await?
            .ok_or_else(|| AuthzError::not_found("role", name))?;
        self.catalog()
            .validate_overrides(&format!("role '{}'", name), &permissions)?;

        role.permissions = permissions;
        let role = self.store.update_role(role).await?;
        self.refresh_catalog().await?;
        Ok(role)
    }

    /// Delete a role. System roles and roles held by any user are refused.
    pub async fn delete_role(&self, actor: Option<&User>, name: &str) -> ActionResponse<String> {
        let action = Action::new("role.delete", "role.DELETE", actor).on(name);
        let result = self.do_delete_role(&action, name).await;
        self.finish(action, result)
    }

    async fn do_delete_role(&self, action: &Action<'_>, name: &str) -> Step<String> {
        self.authorize(action, None)?;
        let role = self
            .store
            .role_by_name(name)
            .await?
            .ok_or_else(|| AuthzError::not_found("role", name))?;
        if role.is_system {
            return Err(AuthzError::SystemRoleProtected { name: role.name }.into());
        }
        let total_assignments = self.store.role_assignments(&role.id).await?;
        if total_assignments > 0 {
            return Err(AuthzError::AssignmentInUse {
                entity: "role".to_string(),
                id: role.name,
                total_assignments,
            }
            .into());
        }
        self.store.delete_role(&role.id).await?;
        self.refresh_catalog().await?;
        Ok(role.id)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Create a user holding `role_name`, which the actor must be allowed to
    /// assign.
    pub async fn create_user(&self, actor: Option<&User>, email: &str, role_name: &str) -> ActionResponse<UserRecord> {
        let action = Action::new("user.create", "user.CREATE", actor).on(email);
        let result = self.do_create_user(&action, email, role_name).await;
        self.finish(action, result)
    }

    async fn do_create_user(&self, action: &Action<'_>, email: &str, role_name: &str) -> Step<UserRecord> {
        let actor = self.authorize(action, None)?;
        let role = self.role_named(role_name)?;
        self.require_assignable(actor, role_name)?;
        Ok(self
            .store
            .insert_user(UserRecord::new(email.trim(), role.id))
            .await?)
    }

    /// Move a user to another role. The actor must be allowed to assign both
    /// the user's current role and the new one.
    pub async fn assign_role(
        &self,
        actor: Option<&User>,
        user_email: &str,
        role_name: &str,
    ) -> ActionResponse<UserRecord> {
        let action = Action::new("user.assign_role", "user.UPDATE", actor).on(user_email);
        let result = self.do_assign_role(&action, user_email, role_name).await;
        self.finish(action, result)
    }

    async fn do_assign_role(&self, action: &Action<'_>, user_email: &str, role_name: &str) -> Step<UserRecord> {
        let actor = self.authorize(action, None)?;
        let mut target = self.user_record(user_email).await?;
        let role = self.role_named(role_name)?;
        self.require_manageable(actor, &target)?;
        self.require_assignable(actor, role_name)?;

        target.role_id = role.id;
        Ok(self.store.update_user(target).await?)
    }

    /// Replace a user's permission overrides. Every key must exist in the
    /// catalog.
    pub async fn set_user_overrides(
        &self,
        actor: Option<&User>,
        user_email: &str,
        overrides: PermissionSet,
    ) -> ActionResponse<UserRecord> {
        let action = Action::new("user.set_overrides", "user.UPDATE", actor).on(user_email);
        let result = self.do_set_user_overrides(&action, user_email, overrides).await;
        self.finish(action, result)
    }

    async fn do_set_user_overrides(
        &self,
        action: &Action<'_>,
        user_email: &str,
        overrides: PermissionSet,
    ) -> Step<UserRecord> {
        let actor = self.authorize(action, None)?;
        let mut target = self.user_record(user_email).await?;
        self.require_manageable(actor, &target)?;
        self.catalog()
            .validate_overrides(&format!("user '{}'", target.email), &overrides)?;

        target.overrides = overrides;
        Ok(self.store.update_user(target).await?)
    }

    pub async fn delete_user(&self, actor: Option<&User>, user_email: &str) -> ActionResponse<String> {
        let action = Action::new("user.delete", "user.DELETE", actor).on(user_email);
        let result = self.do_delete_user(&action, user_email).await;
        self.finish(action, result)
    }

    async fn do_delete_user(&self, action: &Action<'_>, user_email: &str) -> Step<String> {
        let actor = self.authorize(action, None)?;
        let target = self.user_record(user_email).await?;
        self.require_manageable(actor, &target)?;
        self.store.delete_user(&target.id).await?;
        Ok(target.id)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn require_authenticated<'a>(&self, action: &Action<'a>) -> Step<&'a User> {
        action
            .actor
            .ok_or_else(|| Rejection::Denied(Decision::authentication_required()))
    }

    /// Run the permission check for the action. Returns the actor on allow.
    fn authorize<'a>(
        &self,
        action: &Action<'a>,
        context: Option<&ResourceOwnershipContext>,
    ) -> Step<&'a User> {
        let decision = self.checker.check(action.actor, action.permission, context);
        match action.actor {
            Some(actor) if decision.allowed => Ok(actor),
            _ => Err(Rejection::Denied(decision)),
        }
    }

    fn require_assignable(&self, actor: &User, role_name: &str) -> Step<()> {
        if self.checker.can_assign(Some(actor), role_name) {
            Ok(())
        } else {
            Err(Rejection::Denied(Decision::deny(
                DecisionBasis::PermissionDenied,
                format!("You cannot assign the {} role", role_name),
            )))
        }
    }

    /// The actor may only manage users whose current role they could assign.
    fn require_manageable(&self, actor: &User, target: &UserRecord) -> Step<()> {
        let catalog = self.catalog();
        let current = catalog.role_by_id(&target.role_id).ok_or_else(|| {
            AuthzError::store(format!(
                "user '{}' references missing role '{}'",
                target.email, target.role_id
            ))
        })?;
        if self.checker.can_assign(Some(actor), &current.name) {
            Ok(())
        } else {
            Err(Rejection::Denied(Decision::deny(
                DecisionBasis::PermissionDenied,
                format!("You cannot manage users with the {} role", current.name),
            )))
        }
    }

    fn role_named(&self, name: &str) -> Step<Role> {
        self.catalog()
            .role(name)
            .cloned()
            .ok_or_else(|| AuthzError::not_found("role", name).into())
    }

    async fn user_record(&self, email: &str) -> Step<UserRecord> {
        Ok(self
            .store
            .user_by_email(email)
            .await?
            .ok_or_else(|| AuthzError::not_found("user", email))?)
    }

    /// Rebuild the catalog snapshot from the store after a role or
    /// permission mutation.
    async fn refresh_catalog(&self) -> Result<()> {
        let permissions = self.store.permissions().await?;
        let roles = self.store.roles().await?;
        let next = self.catalog().rebuild(permissions, roles)?;
        self.checker.cache().reload(next);
        Ok(())
    }

    fn finish<T>(&self, action: Action<'_>, result: Step<T>) -> ActionResponse<T> {
        let actor = action.actor_label();
        let resource = action.resource_id.as_deref().unwrap_or_default();

        let (response, outcome, detail) = match result {
            Ok(data) => {
                tracing::info!(actor, action = action.name, resource, "action performed");
                (ActionResponse::ok(data), AuditOutcome::Allowed, None)
            }
            Err(Rejection::Denied(decision)) => {
                let reason = decision.reason_or_default().to_string();
                tracing::warn!(
                    actor,
                    action = action.name,
                    resource,
                    basis = %decision.basis,
                    reason = %reason,
                    "action denied"
                );
                (ActionResponse::fail(reason.clone()), AuditOutcome::Denied, Some(reason))
            }
            Err(Rejection::Invalid(message)) => {
                tracing::warn!(actor, action = action.name, error = %message, "invalid request");
                (ActionResponse::fail(message.clone()), AuditOutcome::Rejected, Some(message))
            }
            Err(Rejection::Failed(e)) if e.is_client_error() => {
                let message = e.to_string();
                tracing::warn!(actor, action = action.name, error = %message, "action rejected");
                (ActionResponse::fail(message.clone()), AuditOutcome::Rejected, Some(message))
            }
            Err(Rejection::Failed(e)) => {
                tracing::error!(actor, action = action.name, resource, error = %e, "action failed");
                (ActionResponse::unexpected(), AuditOutcome::Failed, Some(e.to_string()))
            }
        };

        self.record(&action, outcome, detail.as_deref());
        response
    }

    fn record(&self, action: &Action<'_>, outcome: AuditOutcome, detail: Option<&str>) {
        let Some(audit) = &self.audit else {
            return;
        };
        let logger = audit.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = logger.log_decision(
            action.actor_label(),
            action.name,
            action.permission,
            action.resource_id.as_deref(),
            outcome,
            detail,
        ) {
            tracing::error!(error = %e, "failed to write audit entry");
        }
    }
}

fn parse_input_key(raw: &str) -> Step<PermissionKey> {
    PermissionKey::parse(raw).map_err(|e| Rejection::Invalid(e.to_string()))
}
