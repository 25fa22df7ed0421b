//! Status command implementation

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common;
use anyhow::Result;
use serde::Serialize;
use sw_migrate::MigrationPlan;

#[derive(Serialize)]
struct PendingUnit<'a> {
    version: u64,
    name: &'a str,
}

#[derive(Serialize)]
struct StatusView<'a> {
    ledger_table: &'a str,
    current_version: u64,
    latest_version: u64,
    schema_ahead: bool,
    pending: Vec<PendingUnit<'a>>,
}

impl<'a> StatusView<'a> {
    fn new(ledger_table: &'a str, plan: &'a MigrationPlan) -> Self {
        Self {
            ledger_table,
            current_version: plan.current_version,
            latest_version: plan.latest_version,
            schema_ahead: plan.schema_ahead(),
            pending: plan
                .pending()
                .map(|u| PendingUnit {
                    version: u.version(),
                    name: u.name(),
                })
                .collect(),
        }
    }
}

/// Execute the status command
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let config = common::load_config(global)?;
    let db = common::open_database(&config)?;
    let migrator = common::migrator(&config, &db)?;
    let plan = migrator
        .plan(&config.migration_dir())
        .map_err(common::fatal)?;

    let view = StatusView::new(migrator.ledger().table(), &plan);
    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Text => print_status(&view),
    }
    Ok(())
}

fn print_status(view: &StatusView<'_>) {
    println!("Database version: {} (table '{}')", view.current_version, view.ledger_table);
    println!("Latest migration: {}", view.latest_version);
    if view.schema_ahead {
        println!("Warning: database is newer than the latest migration");
    }
    if view.pending.is_empty() {
        println!("Up to date");
        return;
    }
    println!("Pending ({}):", view.pending.len());
    for unit in &view.pending {
        println!("  v{:03} {}", unit.version, unit.name);
    }
}
