//! Stepwise CLI - numbered SQL migrations for a DuckDB database

use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{common, migrate, status, validate};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    common::init_logging(cli.global.verbose);

    let result = match &cli.command {
        cli::Commands::Migrate(args) => migrate::execute(args, &cli.global),
        cli::Commands::Status(args) => status::execute(args, &cli.global),
        cli::Commands::Validate(args) => validate::execute(args, &cli.global),
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            if let Some(code) = err.downcast_ref::<common::ExitCode>() {
                return std::process::ExitCode::from(code.0);
            }
            eprintln!("Error: {err:#}");
            std::process::ExitCode::FAILURE
        }
    }
}
