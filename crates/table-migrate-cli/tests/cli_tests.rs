//! CLI integration tests for table-migrate.
//!
//! These tests verify command-line argument parsing, help output, plan
//! output, and exit codes for error conditions that surface before any
//! database connection is made.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the table-migrate binary.
fn cmd() -> Command {
    Command::cargo_bin("table-migrate").unwrap()
}

/// Write `content` to a temporary YAML file.
fn yaml_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

const MAPPINGS: &str = r#"
tables:
  - source_table: user_role
    destination_table: user_role
    dependencies: [users, roles]
    columns:
      - { source: user_id, destination: user_id }
      - { source: role_id, destination: role_id }
  - source_table: users
    destination_table: users
    columns:
      - { source: id, destination: id, required: true }
      - { source: email, destination: email, transform: lowercase }
      - { destination: is_deleted, default_value: 0 }
  - source_table: roles
    destination_table: roles
    columns:
      - { source: id, destination: id }
"#;

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("test-connection"))
        .stdout(predicate::str::contains("list-tables"));
}

#[test]
fn test_migrate_subcommand_help() {
    cmd()
        .args(["migrate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--batch-size"))
        .stdout(predicate::str::contains("--skip-if-exists"))
        .stdout(predicate::str::contains("--table"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("table-migrate"));
}

#[test]
fn test_global_flags_listed() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--mappings"))
        .stdout(predicate::str::contains("--output-json"))
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: mappings.yaml]"));
}

#[test]
fn test_no_subcommand_shows_usage() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_test_connection_rejects_unknown_side() {
    cmd()
        .args(["test-connection", "staging"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

// =============================================================================
// Plan Tests
// =============================================================================

#[test]
fn test_plan_prints_execution_order() {
    let mappings = yaml_file(MAPPINGS);
    let output = cmd()
        .arg("--mappings")
        .arg(mappings.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Execution order:"))
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    let users = stdout.find("users -> users").unwrap();
    let roles = stdout.find("roles -> roles").unwrap();
    let user_role = stdout.find("user_role -> user_role").unwrap();
    assert!(users < user_role);
    assert!(roles < user_role);
}

#[test]
fn test_plan_json_output() {
    let mappings = yaml_file(MAPPINGS);
    let output = cmd()
        .arg("-m")
        .arg(mappings.path())
        .args(["--output-json", "plan"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        json["execution_order"],
        serde_json::json!(["users", "roles", "user_role"])
    );
}

#[test]
fn test_plan_with_cycle_exits_with_code_1() {
    let mappings = yaml_file(
        r#"
tables:
  - source_table: journals
    destination_table: journals
    dependencies: [journal_details]
    columns: [{ source: id, destination: id }]
  - source_table: journal_details
    destination_table: journal_details
    dependencies: [journals]
    columns: [{ source: id, destination: id }]
"#,
    );
    cmd()
        .arg("--mappings")
        .arg(mappings.path())
        .arg("plan")
        .assert()
        .code(1) // EXIT_CONFIG_ERROR
        .stderr(predicate::str::contains("Circular dependency"));
}

#[test]
fn test_plan_with_missing_dependency_exits_with_code_1() {
    let mappings = yaml_file(
        r#"
tables:
  - source_table: bank_accounts
    destination_table: bank_accounts
    dependencies: [banks]
    columns: [{ source: id, destination: id }]
"#,
    );
    cmd()
        .arg("--mappings")
        .arg(mappings.path())
        .arg("plan")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Missing dependency mapping for table: banks (required by bank_accounts)",
        ));
}

#[test]
fn test_unknown_transform_exits_with_code_1() {
    let mappings = yaml_file(
        r#"
tables:
  - source_table: banks
    destination_table: banks
    columns:
      - { source: name, destination: name, transform: reverse }
"#,
    );
    cmd()
        .arg("--mappings")
        .arg(mappings.path())
        .arg("plan")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown transform"));
}

#[test]
fn test_duplicate_mapping_exits_with_code_1() {
    let mappings = yaml_file(
        r#"
tables:
  - source_table: banks
    destination_table: banks
    columns: [{ source: id, destination: id }]
  - source_table: banks
    destination_table: banks_v2
    columns: [{ source: id, destination: id }]
"#,
    );
    cmd()
        .arg("--mappings")
        .arg(mappings.path())
        .arg("plan")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("duplicate mapping for source table banks"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_mappings_exits_with_code_7() {
    cmd()
        .args(["--mappings", "/nonexistent/mappings.yaml", "plan"])
        .assert()
        .code(7); // EXIT_IO_ERROR - file not found
}

#[test]
fn test_missing_config_exits_with_code_7() {
    let mappings = yaml_file(MAPPINGS);
    cmd()
        .arg("--mappings")
        .arg(mappings.path())
        .args(["--config", "/nonexistent/config.yaml", "migrate", "--dry-run"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_config_yaml_exits_with_code_1() {
    let config = yaml_file("invalid: yaml: content: [");
    cmd()
        .arg("--config")
        .arg(config.path())
        .args(["test-connection", "source"])
        .assert()
        .code(1); // EXIT_CONFIG_ERROR
}

#[test]
fn test_same_source_and_destination_exits_with_code_1() {
    let config = yaml_file(
        r#"
source:
  host: localhost
  database: accounting
  user: root
destination:
  host: localhost
  database: accounting
  user: root
"#,
    );
    cmd()
        .arg("--config")
        .arg(config.path())
        .args(["test-connection", "destination"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot be the same database"));
}

#[test]
fn test_zero_batch_size_exits_with_code_1() {
    let mappings = yaml_file(MAPPINGS);
    cmd()
        .arg("--mappings")
        .arg(mappings.path())
        .args(["migrate", "--batch-size", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("batch_size"));
}

#[test]
fn test_unknown_table_exits_with_code_1() {
    let mappings = yaml_file(MAPPINGS);
    cmd()
        .arg("--mappings")
        .arg(mappings.path())
        .args(["migrate", "--dry-run", "--table", "payments"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Table mapping not found: payments"))
        .stderr(predicate::str::contains("user_role, users, roles"));
}

#[test]
fn test_env_file_is_read_without_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "SOURCE_DB_PORT=not-a-port\n").unwrap();
    cmd()
        .current_dir(dir.path())
        .env_remove("SOURCE_DB_PORT")
        .args(["test-connection", "source"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "SOURCE_DB_PORT must be a port number, got 'not-a-port'",
        ));
}
