//! End-to-end migration runs against an in-memory DuckDB database and a
//! migration directory on disk.

use sw_db::{Database, DuckDbBackend};
use sw_migrate::{
    run_migrations, MigrationError, Migrator, Phase, VersionLedger, MIGRATION_SUBDIR,
};
use tempfile::TempDir;

// ── Helpers ────────────────────────────────────────────────────────────

const INIT: &str = "CREATE TABLE version (version INTEGER NOT NULL);
INSERT INTO version VALUES (0);
CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR);";

fn data_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let migrations = dir.path().join(MIGRATION_SUBDIR);
    std::fs::create_dir(&migrations).unwrap();
    for (name, sql) in files {
        std::fs::write(migrations.join(name), sql).unwrap();
    }
    dir
}

fn relation_exists(db: &DuckDbBackend, name: &str) -> bool {
    db.query_scalar_i64(&format!(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = '{name}'"
    ))
    .unwrap()
    .unwrap()
        > 0
}

fn ledger(db: &DuckDbBackend) -> u64 {
    VersionLedger::default().read(db).unwrap()
}

fn standard_set() -> Vec<(&'static str, &'static str)> {
    vec![
        ("1_init.sql", INIT),
        ("2_posts.sql", "CREATE TABLE posts (id INTEGER, user_id INTEGER);"),
        ("3_seed.sql", "INSERT INTO users VALUES (1, 'admin');"),
    ]
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn applies_all_then_is_idempotent() {
    let dir = data_dir(&standard_set());
    let db = DuckDbBackend::in_memory().unwrap();

    let first = run_migrations(dir.path(), &db).unwrap();
    assert_eq!(first.applied, vec![1, 2, 3]);
    assert_eq!(first.final_version, 3);
    assert_eq!(ledger(&db), 3);
    assert!(relation_exists(&db, "posts"));

    let second = run_migrations(dir.path(), &db).unwrap();
    assert!(second.applied.is_empty());
    assert_eq!(second.starting_version, 3);
    assert_eq!(second.final_version, 3);
    assert_eq!(
        db.query_scalar_i64("SELECT COUNT(*) FROM users").unwrap(),
        Some(1)
    );
}

#[test]
fn empty_database_reads_version_zero() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert_eq!(ledger(&db), 0);
}

#[test]
fn gap_is_fatal_and_applies_nothing() {
    let dir = data_dir(&[("1_init.sql", INIT), ("3_late.sql", "CREATE TABLE late (id INT);")]);
    let db = DuckDbBackend::in_memory().unwrap();

    let err = run_migrations(dir.path(), &db).unwrap_err();
    assert!(matches!(err, MigrationError::Ordering(_)));
    assert!(!relation_exists(&db, "version"));
}

#[test]
fn duplicate_is_fatal() {
    let dir = data_dir(&[
        ("1_init.sql", INIT),
        ("2_a.sql", "CREATE TABLE a (id INT);"),
        ("2_b.sql", "CREATE TABLE b (id INT);"),
    ]);
    let db = DuckDbBackend::in_memory().unwrap();

    let err = run_migrations(dir.path(), &db).unwrap_err();
    assert!(err.to_string().contains("duplicate migration version 2"), "{err}");
}

#[test]
fn failing_script_keeps_earlier_units() {
    let mut files = standard_set();
    files.push(("4_broken.sql", "CREATE TABLE broken (;"));
    files.push(("5_never.sql", "CREATE TABLE never (id INT);"));
    let dir = data_dir(&files);
    let db = DuckDbBackend::in_memory().unwrap();

    let report = run_migrations(dir.path(), &db).unwrap();
    assert_eq!(report.applied, vec![1, 2, 3]);
    assert_eq!(report.final_version, 3);
    let err = report.error.unwrap();
    assert_eq!(err.version, 4);
    assert_eq!(err.phase, Phase::Script);
    assert_eq!(ledger(&db), 3);
    assert!(!relation_exists(&db, "never"));
}

#[test]
fn failing_script_rolls_back_its_own_statements() {
    let dir = data_dir(&[
        ("1_init.sql", INIT),
        (
            "2_partial.sql",
            "CREATE TABLE half (id INT); INSERT INTO missing_table VALUES (1);",
        ),
    ]);
    let db = DuckDbBackend::in_memory().unwrap();

    let report = run_migrations(dir.path(), &db).unwrap();
    assert_eq!(report.final_version, 1);
    assert!(!relation_exists(&db, "half"));
}

#[test]
fn commit_inside_script_breaks_atomicity() {
    let dir = data_dir(&[
        ("1_init.sql", INIT),
        ("2_self_commit.sql", "CREATE TABLE a (x INT); COMMIT; CREATE TABLE b (x INT);"),
    ]);
    let db = DuckDbBackend::in_memory().unwrap();

    let report = run_migrations(dir.path(), &db).unwrap();
    let err = report.error.unwrap();
    assert_eq!(err.version, 2);
    assert_eq!(err.phase, Phase::Commit);
    // Statements after the script's COMMIT ran in autocommit mode.
    assert_eq!(ledger(&db), 2);
    assert!(relation_exists(&db, "a"));
    assert!(relation_exists(&db, "b"));
}

#[test]
fn ledger_failure_rolls_back_script() {
    // No ledger table is created, so the version update fails.
    let dir = data_dir(&[("1_no_ledger.sql", "CREATE TABLE orphan (id INT);")]);
    let db = DuckDbBackend::in_memory().unwrap();

    let report = run_migrations(dir.path(), &db).unwrap();
    let err = report.error.unwrap();
    assert_eq!(err.phase, Phase::Ledger);
    assert!(report.applied.is_empty());
    assert_eq!(ledger(&db), 0);
    assert!(!relation_exists(&db, "orphan"));
}

#[test]
fn resumes_from_ledger_version() {
    let dir = data_dir(&standard_set()[..2]);
    let db = DuckDbBackend::in_memory().unwrap();
    run_migrations(dir.path(), &db).unwrap();
    assert_eq!(ledger(&db), 2);

    let (name, sql) = standard_set()[2];
    std::fs::write(dir.path().join(MIGRATION_SUBDIR).join(name), sql).unwrap();

    let report = run_migrations(dir.path(), &db).unwrap();
    assert_eq!(report.starting_version, 2);
    assert_eq!(report.applied, vec![3]);
}

#[test]
fn malformed_names_are_skipped() {
    let mut files = standard_set();
    files.push(("README.md", "# not sql"));
    files.push(("draft_users.sql", "DROP TABLE users;"));
    let dir = data_dir(&files);
    let db = DuckDbBackend::in_memory().unwrap();

    let report = run_migrations(dir.path(), &db).unwrap();
    assert_eq!(report.applied, vec![1, 2, 3]);
    assert!(relation_exists(&db, "users"));
}

#[test]
fn numeric_not_lexicographic_order() {
    let mut files: Vec<(String, String)> = vec![("1_init.sql".into(), INIT.into())];
    for v in 2..=11 {
        files.push((format!("{v}_t{v}.sql"), format!("CREATE TABLE t{v} (id INT);")));
    }
    let refs: Vec<(&str, &str)> = files.iter().map(|(n, s)| (n.as_str(), s.as_str())).collect();
    let dir = data_dir(&refs);
    let db = DuckDbBackend::in_memory().unwrap();

    let report = run_migrations(dir.path(), &db).unwrap();
    assert_eq!(report.applied, (1..=11).collect::<Vec<_>>());
}

#[test]
fn missing_directory_is_discovery_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = DuckDbBackend::in_memory().unwrap();

    let err = run_migrations(dir.path(), &db).unwrap_err();
    assert!(matches!(err, MigrationError::Discovery { .. }));
}

#[test]
fn persists_across_reopen() {
    let dir = data_dir(&standard_set());
    let db_path = dir.path().join("app.duckdb");
    {
        let db = DuckDbBackend::from_path(&db_path).unwrap();
        run_migrations(dir.path(), &db).unwrap();
    }
    let db = DuckDbBackend::from_path(&db_path).unwrap();
    let report = run_migrations(dir.path(), &db).unwrap();
    assert_eq!(report.starting_version, 3);
    assert!(report.applied.is_empty());
}

#[test]
fn custom_ledger_table() {
    let dir = data_dir(&[(
        "1_init.sql",
        "CREATE TABLE schema_version (version INTEGER); INSERT INTO schema_version VALUES (0);",
    )]);
    let db = DuckDbBackend::in_memory().unwrap();
    let migrator = Migrator::new(&db, VersionLedger::new("schema_version").unwrap());

    let report = migrator.run(&dir.path().join(MIGRATION_SUBDIR)).unwrap();
    assert_eq!(report.final_version, 1);
    assert_eq!(migrator.ledger().table(), "schema_version");
    assert_eq!(migrator.ledger().read(&db).unwrap(), 1);
}

#[test]
fn plan_does_not_touch_schema() {
    let dir = data_dir(&standard_set());
    let db = DuckDbBackend::in_memory().unwrap();
    let migrator = Migrator::new(&db, VersionLedger::default());

    let plan = migrator.plan(&dir.path().join(MIGRATION_SUBDIR)).unwrap();
    assert_eq!(plan.pending_versions(), vec![1, 2, 3]);
    assert!(!relation_exists(&db, "version"));
}
