//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use sw_core::Config;
use sw_db::{Database, DuckDbBackend};
use sw_migrate::{MigrationError, Migrator, VersionLedger};

use crate::cli::GlobalArgs;

/// Exit code for configuration-level migration defects (discovery, ordering).
pub(crate) const EXIT_FATAL_MIGRATION: u8 = 2;

/// Exit code for a failed migration under `--strict`.
pub(crate) const EXIT_MIGRATION_FAILED: u8 = 3;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main.rs downcasts it before anything is printed.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Install the `env_logger` backend. `RUST_LOG` overrides the default level.
pub(crate) fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

/// Load and validate the configuration selected by the global arguments.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    match &global.config {
        Some(path) => Config::load(Path::new(path)).context("Failed to load configuration file"),
        None => Config::load_from_dir(Path::new(&global.project_dir))
            .context("Failed to load project configuration"),
    }
}

/// Open the configured database and check that it answers.
pub(crate) fn open_database(config: &Config) -> Result<DuckDbBackend> {
    let path = config
        .database_path()
        .context("No database driver is provided")?;
    let db = DuckDbBackend::new(&path).context("Failed to setup database")?;
    db.ping().context("Failed to connect to database")?;
    log::info!("Connected to {} database at {path}", db.db_type());
    Ok(db)
}

/// Build a migrator bound to the configured ledger table.
pub(crate) fn migrator<'a>(config: &Config, db: &'a dyn Database) -> Result<Migrator<'a>> {
    let ledger = VersionLedger::new(config.version_table())
        .context("Failed to configure version ledger")?;
    Ok(Migrator::new(db, ledger))
}

/// Report a run-stopping migration error and turn it into an exit code.
pub(crate) fn fatal(err: MigrationError) -> anyhow::Error {
    eprintln!("Error: {err}");
    ExitCode(EXIT_FATAL_MIGRATION).into()
}
