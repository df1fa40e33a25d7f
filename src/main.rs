//! journal-authz - Role-based authorization for an academic journal CMS
//!
//! Command-line front end over the permission checker and the action
//! gateway. Gateway commands print the action response as JSON.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use journal_authz::audit::{AuditLogger, AuditOutcome};
use journal_authz::authz::{
    Decision, PermissionCatalog, ResourceOwnershipContext, ResourceType, Role, User, SUPER_ADMIN,
};
use journal_authz::config::{AuthzConfig, ConfigValidator};
use journal_authz::gateway::{ActionGateway, ActionResponse};
use journal_authz::store::{demo, ArticleUpdate, MemoryStore, StoreState, UserRecord};
use journal_authz::AuthzError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Exit code of `check` and `can-assign` when the answer is no.
const EXIT_DENIED: i32 = 3;

#[derive(Parser)]
#[command(name = "journal-authz")]
#[command(version)]
#[command(about = "Role-based authorization for the journal admin surface", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Data directory holding .journal/ (defaults to current directory)
    #[arg(short, long, global = true, env = "JOURNAL_AUTHZ_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration and seed the store
    Init {
        /// Overwrite an existing configuration and store
        #[arg(short, long)]
        force: bool,

        /// Create a Super Admin user with this email
        #[arg(long, value_name = "EMAIL")]
        admin_email: Option<String>,

        /// Seed sample users, authors and articles
        #[arg(long)]
        demo: bool,
    },

    /// Check one permission for a user (exit 0 allowed, 3 denied)
    Check {
        /// Email of the user; an unknown email checks as unauthenticated
        #[arg(short, long, value_name = "EMAIL")]
        user: String,

        /// Permission key, e.g. article.UPDATE
        #[arg(short, long, value_name = "KEY")]
        permission: String,

        /// Resource type for ownership-scoped checks
        #[arg(long, value_name = "TYPE", requires = "resource_id")]
        resource_type: Option<ResourceType>,

        /// Resource id for ownership-scoped checks
        #[arg(long, value_name = "ID", requires = "resource_type")]
        resource_id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a user may assign a role (exit 0 yes, 3 no)
    CanAssign {
        #[arg(short, long, value_name = "EMAIL")]
        user: String,

        #[arg(short, long, value_name = "NAME")]
        role: String,
    },

    /// Show or validate the role/permission catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Gated article actions
    Article {
        #[command(subcommand)]
        action: ArticleAction,
    },

    /// Gated permission actions
    Permission {
        #[command(subcommand)]
        action: PermissionAction,
    },

    /// Gated role actions
    Role {
        #[command(subcommand)]
        action: RoleAction,
    },

    /// Gated user actions
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Inspect the audit trail
    Audit {
        #[command(subcommand)]
        action: AuditAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Show permissions, roles and the role hierarchy
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,
}

#[derive(Subcommand)]
enum ArticleAction {
    /// Change an article's title
    Update {
        /// Email of the acting user
        #[arg(long = "as", value_name = "EMAIL")]
        actor: String,

        #[arg(long)]
        id: String,

        #[arg(long)]
        title: String,
    },

    /// Delete an article
    Delete {
        /// Email of the acting user
        #[arg(long = "as", value_name = "EMAIL")]
        actor: String,

        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum PermissionAction {
    /// Delete an unassigned permission
    Delete {
        /// Email of the acting user
        #[arg(long = "as", value_name = "EMAIL")]
        actor: String,

        #[arg(long)]
        key: String,
    },
}

#[derive(Subcommand)]
enum RoleAction {
    /// Delete an unassigned, non-system role
    Delete {
        /// Email of the acting user
        #[arg(long = "as", value_name = "EMAIL")]
        actor: String,

        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Move a user to another role
    AssignRole {
        /// Email of the acting user
        #[arg(long = "as", value_name = "EMAIL")]
        actor: String,

        /// Email of the user to change
        #[arg(long, value_name = "EMAIL")]
        user: String,

        #[arg(long, value_name = "NAME")]
        role: String,
    },
}

#[derive(Subcommand)]
enum AuditAction {
    /// Verify the hash chain of the audit trail
    Verify {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the most recent audit entries
    Show {
        /// Show last N entries
        #[arg(short, long, default_value = "20")]
        last: usize,
    },
}

/// The opened data directory.
struct Journal {
    gateway: ActionGateway<MemoryStore>,
}

impl Journal {
    async fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let config = AuthzConfig::load(data_dir)?;
        config.ensure_valid()?;

        let store_path = config.store_path(data_dir);
        let store = match MemoryStore::open(&store_path) {
            Ok(store) => store,
            Err(e @ AuthzError::MissingFile { .. }) => {
                return Err(anyhow::Error::new(e).context("Run 'journal-authz init' first"));
            }
            Err(e) => return Err(e.into()),
        };

        let mut gateway = ActionGateway::open(Arc::new(store), &config).await?;
        if config.audit.enabled {
            let logger =
                AuditLogger::with_rotation(data_dir.to_path_buf(), config.audit.rotation.clone())?;
            gateway = gateway.with_audit(logger);
        }
        Ok(Self { gateway })
    }

    async fn user(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = self.gateway.resolve_user(email).await?;
        if user.is_none() {
            tracing::debug!(email, "no such user, treating as unauthenticated");
        }
        Ok(user)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "journal_authz=debug,info"
    } else {
        "journal_authz=info,warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if !cli.data_dir.exists() {
        eprintln!(
            "{} Data directory does not exist: {}",
            "Error:".red().bold(),
            cli.data_dir.display()
        );
        std::process::exit(1);
    }

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            let code = e
                .downcast_ref::<AuthzError>()
                .map(AuthzError::exit_code)
                .unwrap_or(1);
            std::process::exit(code);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let data_dir = cli.data_dir.as_path();

    match cli.command {
        Commands::Init {
            force,
            admin_email,
            demo,
        } => init(data_dir, force, admin_email.as_deref(), demo),

        Commands::Check {
            user,
            permission,
            resource_type,
            resource_id,
            json,
        } => {
            let journal = Journal::open(data_dir).await?;
            let user = journal.user(&user).await?;
            let context = resource_type
                .zip(resource_id)
                .map(|(t, id)| ResourceOwnershipContext::new(t, id));

            let decision = journal
                .gateway
                .checker()
                .check(user.as_ref(), &permission, context.as_ref());

            if json {
                println!("{}", serde_json::to_string_pretty(&decision)?);
            } else {
                print_decision(&permission, &decision);
            }
            Ok(if decision.allowed { 0 } else { EXIT_DENIED })
        }

        Commands::CanAssign { user, role } => {
            let journal = Journal::open(data_dir).await?;
            let user = journal.user(&user).await?;
            let allowed = journal.gateway.checker().can_assign(user.as_ref(), &role);
            if allowed {
                println!("{} may assign {}", "OK".green().bold(), role.cyan());
                Ok(0)
            } else {
                println!("{} may not assign {}", "NO".red().bold(), role.cyan());
                Ok(EXIT_DENIED)
            }
        }

        Commands::Catalog { action } => match action {
            CatalogAction::Show { json } => {
                let journal = Journal::open(data_dir).await?;
                show_catalog(&journal, json)
            }
            CatalogAction::Validate => {
                let report = ConfigValidator::new(data_dir).validate()?;
                if cli.verbose || !report.is_valid() || !report.warnings.is_empty() {
                    println!("{}", report.verbose_report());
                } else {
                    println!("{} {}", "OK".green().bold(), report.summary());
                }
                Ok(report.exit_code())
            }
        },

        Commands::Article { action } => {
            let journal = Journal::open(data_dir).await?;
            match action {
                ArticleAction::Update { actor, id, title } => {
                    let actor = journal.user(&actor).await?;
                    let update = ArticleUpdate {
                        title: Some(title),
                        ..Default::default()
                    };
                    let response = journal.gateway.update_article(actor.as_ref(), &id, update).await;
                    print_response(&response)
                }
                ArticleAction::Delete { actor, id } => {
                    let actor = journal.user(&actor).await?;
                    let response = journal.gateway.delete_article(actor.as_ref(), &id).await;
                    print_response(&response)
                }
            }
        }

        Commands::Permission { action } => {
            let journal = Journal::open(data_dir).await?;
            match action {
                PermissionAction::Delete { actor, key } => {
                    let actor = journal.user(&actor).await?;
                    let response = journal.gateway.delete_permission(actor.as_ref(), &key).await;
                    print_response(&response)
                }
            }
        }

        Commands::Role { action } => {
            let journal = Journal::open(data_dir).await?;
            match action {
                RoleAction::Delete { actor, name } => {
                    let actor = journal.user(&actor).await?;
                    let response = journal.gateway.delete_role(actor.as_ref(), &name).await;
                    print_response(&response)
                }
            }
        }

        Commands::User { action } => {
            let journal = Journal::open(data_dir).await?;
            match action {
                UserAction::AssignRole { actor, user, role } => {
                    let actor = journal.user(&actor).await?;
                    let response = journal
                        .gateway
                        .assign_role(actor.as_ref(), &user, &role)
                        .await;
                    print_response(&response)
                }
            }
        }

        Commands::Audit { action } => {
            let logger = AuditLogger::new(data_dir.to_path_buf())?;
            match action {
                AuditAction::Verify { json } => {
                    let result = logger.verify()?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&result)?);
                    } else if result.is_valid {
                        println!(
                            "{} Audit trail intact ({} entries)",
                            "OK".green().bold(),
                            result.entries_verified
                        );
                    } else {
                        println!(
                            "{} Audit trail broken at entry {}: {}",
                            "FAIL".red().bold(),
                            result.first_invalid_entry.unwrap_or_default(),
                            result.error_description.as_deref().unwrap_or("unknown")
                        );
                    }
                    Ok(if result.is_valid { 0 } else { 1 })
                }
                AuditAction::Show { last } => {
                    let entries = logger.tail(last)?;
                    if entries.is_empty() {
                        println!("{}", "No audit entries.".dimmed());
                    }
                    for entry in entries {
                        let outcome = match entry.outcome {
                            AuditOutcome::Allowed => entry.outcome.to_string().green(),
                            AuditOutcome::Denied => entry.outcome.to_string().yellow(),
                            AuditOutcome::Rejected => entry.outcome.to_string().blue(),
                            AuditOutcome::Failed => entry.outcome.to_string().red(),
                        };
                        println!(
                            "{:>5} {} {:<9} {} {} {}",
                            entry.sequence,
                            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                            outcome,
                            entry.actor.cyan(),
                            entry.action,
                            entry.resource_id.as_deref().unwrap_or("-").dimmed()
                        );
                        if let Some(detail) = entry.detail {
                            println!("      {}", detail.dimmed());
                        }
                    }
                    Ok(0)
                }
            }
        }
    }
}

fn init(
    data_dir: &Path,
    force: bool,
    admin_email: Option<&str>,
    with_demo: bool,
) -> anyhow::Result<i32> {
    let config_path = AuthzConfig::config_path(data_dir);
    if config_path.exists() && !force {
        eprintln!(
            "{} Already initialized at {}. Use --force to overwrite.",
            "Error:".red().bold(),
            config_path.display()
        );
        return Ok(1);
    }

    let config = AuthzConfig::with_standard_seed();
    let path = config.save(data_dir)?;
    println!("{} Wrote {}", "OK".green().bold(), path.display());

    let permissions: PermissionCatalog = config.seed_permissions()?;
    let mut state = StoreState::seeded(&permissions, config.seed_roles()?);
    if with_demo {
        state = demo::with_demo_content(state);
    }
    if let Some(email) = admin_email {
        state
            .users
            .push(UserRecord::new(email.trim(), Role::system_id(SUPER_ADMIN)));
    }

    let store_path = config.store_path(data_dir);
    let store = MemoryStore::create(&store_path, state)
        .with_context(|| format!("Failed to seed {}", store_path.display()))?;
    let seeded = store.snapshot();
    println!(
        "{} Seeded {} ({} permissions, {} roles, {} users)",
        "OK".green().bold(),
        store_path.display(),
        seeded.permissions.len(),
        seeded.roles.len(),
        seeded.users.len()
    );
    Ok(0)
}

fn print_decision(permission: &str, decision: &Decision) {
    if decision.allowed {
        println!(
            "{} {} ({})",
            "ALLOWED".green().bold(),
            permission,
            decision.basis
        );
    } else {
        println!(
            "{} {}: {}",
            "DENIED".red().bold(),
            permission,
            decision.reason_or_default()
        );
    }
}

fn print_response<T: Serialize>(response: &ActionResponse<T>) -> anyhow::Result<i32> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(if response.is_success() { 0 } else { 1 })
}

fn show_catalog(journal: &Journal, json: bool) -> anyhow::Result<i32> {
    let catalog = journal.gateway.catalog();

    if json {
        let value = serde_json::json!({
            "permissions": catalog.permissions().iter().collect::<Vec<_>>(),
            "roles": catalog.roles().collect::<Vec<_>>(),
            "roleHierarchy": catalog.hierarchy(),
            "ownershipScoped": catalog.ownership_scoped().collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(0);
    }

    println!("{}", "Permissions".bold());
    for permission in catalog.permissions().iter() {
        let scoped = if catalog.is_ownership_scoped(&permission.key) {
            " (owner)".cyan().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<24} {}{}",
            permission.key.as_str(),
            permission.description.dimmed(),
            scoped
        );
    }

    println!();
    println!("{}", "Roles (lowest to highest)".bold());
    for name in catalog.hierarchy().names() {
        if let Some(role) = catalog.role(name) {
            println!("  {:<12} {} permission(s)", role.name, role.permissions.len());
        }
    }
    let unranked: Vec<&Role> = catalog
        .roles()
        .filter(|r| catalog.hierarchy().rank(&r.name).is_none())
        .collect();
    for role in unranked {
        println!(
            "  {:<12} {} permission(s) {}",
            role.name,
            role.permissions.len(),
            "(unranked)".yellow()
        );
    }
    Ok(0)
}
