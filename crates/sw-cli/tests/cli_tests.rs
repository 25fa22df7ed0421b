//! CLI integration tests for the `sw` binary

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Path to the compiled sw binary
fn sw_bin() -> String {
    env!("CARGO_BIN_EXE_sw").to_string()
}

/// Run `sw` in `project` and return (stdout, stderr, exit code).
fn run_sw(project: &Path, args: &[&str]) -> (String, String, Option<i32>) {
    let output = Command::new(sw_bin())
        .args(["--project-dir", project.to_str().unwrap()])
        .args(args)
        .env_remove("STEPWISE_CONFIG")
        .env("RUST_LOG", "warn")
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute sw with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code(),
    )
}

const CONFIG: &str = r#"
server:
  port: 8080
  url: http://localhost:8080
database:
  duckdb:
    path: data/app.duckdb
folders:
  data: data
"#;

const INIT: &str = "CREATE TABLE version (version INTEGER NOT NULL);
INSERT INTO version VALUES (0);
CREATE TABLE users (id INTEGER);";

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("stepwise.yml"), CONFIG).unwrap();
    let migrations = dir.path().join("data").join("migration");
    std::fs::create_dir_all(&migrations).unwrap();
    for (name, sql) in files {
        std::fs::write(migrations.join(name), sql).unwrap();
    }
    dir
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
}

// ── migrate ────────────────────────────────────────────────────────────

#[test]
fn test_migrate_applies_and_is_idempotent() {
    let dir = project(&[("1_init.sql", INIT), ("2_posts.sql", "CREATE TABLE posts (id INT);")]);

    let (stdout, stderr, code) = run_sw(dir.path(), &["migrate", "--output", "json"]);
    assert_eq!(code, Some(0), "stderr: {stderr}");
    let report = json(&stdout);
    assert_eq!(report["applied"], serde_json::json!([1, 2]));
    assert_eq!(report["final_version"], 2);

    let (stdout, _, code) = run_sw(dir.path(), &["migrate"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("Nothing to apply"), "{stdout}");
    assert!(stdout.contains("Database is at version 2"), "{stdout}");
}

#[test]
fn test_migrate_ordering_violation_exits_2() {
    let dir = project(&[("1_init.sql", INIT), ("3_gap.sql", "SELECT 1;")]);

    let (_, stderr, code) = run_sw(dir.path(), &["migrate"]);
    assert_eq!(code, Some(2));
    assert_eq!(stderr.matches("MG002").count(), 1, "{stderr}");
}

#[test]
fn test_migrate_failure_is_degraded_by_default() {
    let dir = project(&[("1_init.sql", INIT), ("2_broken.sql", "CREATE TABLE (;")]);

    let (stdout, _, code) = run_sw(dir.path(), &["migrate"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("Failed:"), "{stdout}");
    assert!(stdout.contains("Database is at version 1"), "{stdout}");
}

#[test]
fn test_migrate_failure_strict_exits_3() {
    let dir = project(&[("1_init.sql", INIT), ("2_broken.sql", "CREATE TABLE (;")]);

    let (stdout, _, code) = run_sw(dir.path(), &["migrate", "--strict", "--output", "json"]);
    assert_eq!(code, Some(3));
    let report = json(&stdout);
    assert_eq!(report["error"]["phase"], "script");
    assert_eq!(report["error"]["version"], 2);
}

#[test]
fn test_migrate_missing_config_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_sw(dir.path(), &["migrate"]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("C001"), "{stderr}");
}

#[test]
fn test_migrate_invalid_port_exits_1() {
    let dir = project(&[("1_init.sql", INIT)]);
    std::fs::write(
        dir.path().join("stepwise.yml"),
        CONFIG.replace("port: 8080", "port: 0"),
    )
    .unwrap();

    let (_, stderr, code) = run_sw(dir.path(), &["migrate"]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("server.port"), "{stderr}");
}

// ── status ─────────────────────────────────────────────────────────────

#[test]
fn test_status_lists_pending() {
    let dir = project(&[("1_init.sql", INIT), ("2_posts.sql", "CREATE TABLE posts (id INT);")]);

    let (stdout, stderr, code) = run_sw(dir.path(), &["status", "--output", "json"]);
    assert_eq!(code, Some(0), "stderr: {stderr}");
    let status = json(&stdout);
    assert_eq!(status["ledger_table"], "version");
    assert_eq!(status["current_version"], 0);
    assert_eq!(status["latest_version"], 2);
    assert_eq!(status["pending"][1]["name"], "2_posts.sql");

    run_sw(dir.path(), &["migrate"]);
    let (stdout, _, _) = run_sw(dir.path(), &["status"]);
    assert!(stdout.contains("Up to date"), "{stdout}");
}

// ── validate ───────────────────────────────────────────────────────────

#[test]
fn test_validate_ok() {
    let dir = project(&[("1_init.sql", INIT), ("notes.txt", "ignored")]);

    let (stdout, _, code) = run_sw(dir.path(), &["validate"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("Configuration OK"), "{stdout}");
    assert!(stdout.contains("1 migration(s)"), "{stdout}");
    assert!(!dir.path().join("data/app.duckdb").exists());
}

#[test]
fn test_validate_duplicate_exits_2() {
    let dir = project(&[
        ("1_init.sql", INIT),
        ("2_a.sql", "SELECT 1;"),
        ("2_b.sql", "SELECT 2;"),
    ]);

    let (_, stderr, code) = run_sw(dir.path(), &["validate"]);
    assert_eq!(code, Some(2));
    assert!(stderr.contains("duplicate migration version 2"), "{stderr}");
}

#[test]
fn test_explicit_config_path() {
    let dir = project(&[("1_init.sql", INIT)]);
    let other = tempfile::tempdir().unwrap();
    let config = dir.path().join("stepwise.yml");

    let (stdout, stderr, code) = run_sw(
        other.path(),
        &["validate", "--config", config.to_str().unwrap()],
    );
    assert_eq!(code, Some(0), "stderr: {stderr}");
    assert!(stdout.contains("Configuration OK"));
}
