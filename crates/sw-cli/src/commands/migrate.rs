//! Migrate command implementation

use crate::cli::{GlobalArgs, MigrateArgs, OutputFormat};
use crate::commands::common::{self, ExitCode, EXIT_MIGRATION_FAILED};
use anyhow::Result;
use sw_migrate::MigrationReport;

/// Execute the migrate command
pub(crate) fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let config = common::load_config(global)?;
    let db = common::open_database(&config)?;
    let migrator = common::migrator(&config, &db)?;

    let report = migrator
        .run(&config.migration_dir())
        .map_err(common::fatal)?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }

    if let Some(err) = &report.error {
        log::error!(
            "Schema is behind: stopped at version {} of {}: {err}",
            report.final_version,
            report.latest_version
        );
        if args.strict {
            return Err(ExitCode(EXIT_MIGRATION_FAILED).into());
        }
    }
    Ok(())
}

fn print_report(report: &MigrationReport) {
    if report.changed() {
        let applied: Vec<String> = report.applied.iter().map(u64::to_string).collect();
        println!(
            "Applied {} migration(s): {}",
            report.applied.len(),
            applied.join(", ")
        );
    } else if report.is_success() {
        println!("Nothing to apply");
    }

    if let Some(err) = &report.error {
        println!("Failed: {err}");
    }

    println!(
        "Database is at version {} (latest migration: {})",
        report.final_version, report.latest_version
    );
}
