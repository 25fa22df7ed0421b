//! Validate command implementation

use crate::cli::{GlobalArgs, ValidateArgs};
use crate::commands::common;
use anyhow::Result;
use sw_migrate::{discover, validate_ordering, MigrationError};

/// Execute the validate command
pub(crate) fn execute(_args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let config = common::load_config(global)?;
    println!("Configuration OK");

    let dir = config.migration_dir();
    let units = discover(&dir).map_err(common::fatal)?;
    let latest = validate_ordering(&units)
        .map_err(|e| common::fatal(MigrationError::Ordering(e)))?;

    if units.is_empty() {
        println!("No migrations in {}", dir.display());
    } else {
        println!(
            "{} migration(s) in {}, ordered 1..{latest}",
            units.len(),
            dir.display()
        );
    }
    Ok(())
}
