//! fieldmeta CLI.
//!
//! Commands:
//! - `fieldmeta types [--json]`: List the field-type catalogue
//! - `fieldmeta decode <file> [--yaml]`: Print a definition's typed view
//! - `fieldmeta check <file> --references <fixture>`: Settle a definition
//!   against fixture data and print the normalized definition
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error
//! - 2: Completed with warnings or normalization changes

use std::sync::Arc;

use clap::Parser;

use fieldmeta::check::run_check;
use fieldmeta::decode::run_decode;
use fieldmeta::list::render_types;
use fieldmeta::{logging, Cli, Commands, EXIT_ERROR, EXIT_OK, EXIT_WARNINGS};
use fieldmeta_config::{load_configuration, EngineConfig, DEFAULT_LOG_FILTER};
use fieldmeta_schema::FieldTypeRegistry;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = load_configuration(cli.config.as_deref());
    let configured = config
        .as_ref()
        .map(|c| c.logging.filter.as_str())
        .unwrap_or(DEFAULT_LOG_FILTER);
    logging::init(logging::build_filter(cli.debug, configured));

    let exit_code = match config {
        Ok(config) => dispatch_command(cli.command, &config).await,
        Err(e) => {
            eprintln!("Error: {e}");
            EXIT_ERROR
        }
    };
    std::process::exit(exit_code);
}

async fn dispatch_command(command: Commands, config: &EngineConfig) -> i32 {
    let registry = Arc::new(FieldTypeRegistry::builtin());
    let result = match command {
        Commands::Types { json } => render_types(&registry, json).map(|out| {
            println!("{out}");
            EXIT_OK
        }),
        Commands::Decode { file, yaml } => run_decode(&registry, &file, yaml).map(|out| {
            println!("{}", out.rendered);
            for warning in &out.warnings {
                eprintln!("Warning: {warning}");
            }
            if out.warnings.is_empty() {
                EXIT_OK
            } else {
                EXIT_WARNINGS
            }
        }),
        Commands::Check {
            file,
            references,
            yaml,
        } => match run_check(registry, config, &file, &references).await {
            Ok(report) => report.render(yaml).map(|out| {
                println!("{out}");
                if let Some(table) = report.changes_table() {
                    eprintln!("{table}");
                }
                for warning in &report.warnings {
                    eprintln!("Warning: {warning}");
                }
                if report.is_clean() {
                    EXIT_OK
                } else {
                    EXIT_WARNINGS
                }
            }),
            Err(e) => Err(e),
        },
    };
    result_to_exit(result)
}

/// Convert a command result into an exit code.
fn result_to_exit(result: anyhow::Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            EXIT_ERROR
        }
    }
}
