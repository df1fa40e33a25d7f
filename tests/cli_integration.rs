//! Integration tests for the journal-authz CLI

use assert_cmd::cargo;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ROOT: &str = "root@journal.test";
const ADMIN: &str = "admin@journal.test";
const ADA: &str = "ada@journal.test";
const VIEWER: &str = "viewer@journal.test";

/// Get a Command for the journal-authz binary
fn journal_authz() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("journal-authz"));
    cmd.env_remove("JOURNAL_AUTHZ_DATA_DIR");
    cmd.env("NO_COLOR", "1");
    cmd
}

/// A command rooted at `temp`.
fn in_dir(temp: &TempDir) -> Command {
    let mut cmd = journal_authz();
    cmd.arg("--data-dir").arg(temp.path());
    cmd
}

/// Initialize a data directory with the demo content.
fn demo_journal() -> TempDir {
    let temp = TempDir::new().unwrap();
    in_dir(&temp).args(["init", "--demo"]).assert().success();
    temp
}

// =============================================================================
// Basics
// =============================================================================

#[test]
fn test_help() {
    journal_authz()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Role-based authorization"));
}

#[test]
fn test_version() {
    journal_authz()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_init_creates_structure() {
    let temp = TempDir::new().unwrap();

    in_dir(&temp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded"));

    assert!(temp.path().join(".journal/authz.json").exists());
    assert!(temp.path().join(".journal/store.json").exists());
}

#[test]
fn test_init_refuses_to_overwrite() {
    let temp = demo_journal();

    in_dir(&temp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Already initialized"));

    in_dir(&temp).args(["init", "--force"]).assert().success();
}

#[test]
fn test_commands_require_init() {
    let temp = TempDir::new().unwrap();

    in_dir(&temp)
        .args(["check", "--user", ADA, "--permission", "article.READ"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("init"));
}

#[test]
fn test_init_with_admin_email() {
    let temp = TempDir::new().unwrap();
    in_dir(&temp)
        .args(["init", "--admin-email", "chief@journal.test"])
        .assert()
        .success();

    in_dir(&temp)
        .args(["check", "--user", "chief@journal.test", "--permission", "role.DELETE"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ALLOWED"));
}

// =============================================================================
// Checks
// =============================================================================

#[test]
fn test_check_allowed_and_denied() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["check", "--user", VIEWER, "--permission", "article.READ"])
        .assert()
        .success();

    in_dir(&temp)
        .args(["check", "--user", VIEWER, "--permission", "article.DELETE"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("You don't have permission to delete articles"));
}

#[test]
fn test_check_unknown_user_is_unauthenticated() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["check", "--user", "nobody@journal.test", "--permission", "article.READ"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Authentication required"));
}

#[test]
fn test_check_ownership() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["check", "--user", ADA, "--permission", "article.UPDATE"])
        .args(["--resource-type", "article", "--resource-id", "art-owned"])
        .assert()
        .success();

    in_dir(&temp)
        .args(["check", "--user", ADA, "--permission", "article.UPDATE"])
        .args(["--resource-type", "article", "--resource-id", "art-other"])
        .assert()
        .code(3);
}

#[test]
fn test_check_json_output() {
    let temp = demo_journal();

    let output = in_dir(&temp)
        .args(["check", "--user", ADA, "--permission", "article.UPDATE", "--json"])
        .args(["--resource-type", "article", "--resource-id", "art-owned"])
        .output()
        .unwrap();
    let decision: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(decision["allowed"], true);
    assert_eq!(decision["basis"], "owner_grant");
}

#[test]
fn test_check_unknown_permission() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["check", "--user", ADMIN, "--permission", "article.PUBLISH"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Unknown permission"));
}

#[test]
fn test_can_assign() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["can-assign", "--user", ADMIN, "--role", "Editor"])
        .assert()
        .success();

    in_dir(&temp)
        .args(["can-assign", "--user", ADMIN, "--role", "Super Admin"])
        .assert()
        .code(3);
}

// =============================================================================
// Catalog
// =============================================================================

#[test]
fn test_catalog_show() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["catalog", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("article.UPDATE"))
        .stdout(predicate::str::contains("Super Admin"));
}

#[test]
fn test_catalog_show_json() {
    let temp = demo_journal();

    let output = in_dir(&temp)
        .args(["catalog", "show", "--json"])
        .output()
        .unwrap();
    let catalog: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(catalog["roleHierarchy"][0], "Viewer");
    assert_eq!(catalog["roles"].as_array().unwrap().len(), 5);
    assert!(catalog["ownershipScoped"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("article.DELETE")));
}

#[test]
fn test_catalog_validate() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["catalog", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn test_catalog_validate_reports_errors() {
    let temp = demo_journal();
    std::fs::write(
        temp.path().join(".journal/authz.json"),
        r#"{"permissions": [{"key": "article.archive"}]}"#,
    )
    .unwrap();

    in_dir(&temp)
        .args(["catalog", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("article.archive"));
}

// =============================================================================
// Gateway commands
// =============================================================================

#[test]
fn test_article_update_by_owner() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["article", "update", "--as", ADA, "--id", "art-owned", "--title", "Revised"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"))
        .stdout(predicate::str::contains("Revised"));
}

#[test]
fn test_article_update_by_non_owner() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["article", "update", "--as", ADA, "--id", "art-other", "--title", "Mine"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"success\": false"))
        .stdout(predicate::str::contains("You don't have permission to update articles"));
}

#[test]
fn test_article_delete_persists() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["article", "delete", "--as", ADA, "--id", "art-owned"])
        .assert()
        .success();

    in_dir(&temp)
        .args(["article", "delete", "--as", ADA, "--id", "art-owned"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("article not found: art-owned"));
}

#[test]
fn test_permission_delete_in_use() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["permission", "delete", "--as", ROOT, "--key", "article.READ"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("still assigned"));
}

#[test]
fn test_role_delete_system_role() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["role", "delete", "--as", ROOT, "--name", "Editor"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("system role"));
}

#[test]
fn test_user_assign_role() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["user", "assign-role", "--as", ADMIN, "--user", VIEWER, "--role", "Editor"])
        .assert()
        .success();

    in_dir(&temp)
        .args(["check", "--user", VIEWER, "--permission", "article.DELETE"])
        .assert()
        .success();

    in_dir(&temp)
        .args(["user", "assign-role", "--as", ADMIN, "--user", VIEWER, "--role", "Super Admin"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("You cannot assign the Super Admin role"));
}

// =============================================================================
// Audit
// =============================================================================

#[test]
fn test_audit_trail_records_gateway_commands() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["article", "update", "--as", ADA, "--id", "art-owned", "--title", "One"])
        .assert()
        .success();
    in_dir(&temp)
        .args(["role", "delete", "--as", ADA, "--name", "Editor"])
        .assert()
        .failure();

    in_dir(&temp)
        .args(["audit", "verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Audit trail intact (2 entries)"));

    in_dir(&temp)
        .args(["audit", "show", "--last", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("article.update"))
        .stdout(predicate::str::contains("denied"));
}

#[test]
fn test_audit_verify_detects_tampering() {
    let temp = demo_journal();

    in_dir(&temp)
        .args(["article", "delete", "--as", ADA, "--id", "art-owned"])
        .assert()
        .success();

    let audit = temp.path().join(".journal/audit.jsonl");
    let content = std::fs::read_to_string(&audit).unwrap();
    std::fs::write(&audit, content.replace(ADA, "mallory@journal.test")).unwrap();

    in_dir(&temp)
        .args(["audit", "verify", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"is_valid\": false"));
}
