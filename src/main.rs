//! Main entry point for tabcompare CLI

use clap::Parser;
use tabcompare::cli::Cli;
use tabcompare::commands::execute_command;
use tabcompare::error::{EXIT_INVALID_INPUT, EXIT_SUCCESS};
use tabcompare::instrument::{init_logging, LogConfig};

fn main() {
    // Parse command line arguments
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                EXIT_INVALID_INPUT
            } else {
                EXIT_SUCCESS
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // Initialize logging
    let log_config = match LogConfig::from_flags(cli.verbose, cli.quiet, cli.log_level.as_deref()) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(EXIT_INVALID_INPUT);
        }
    };
    init_logging(&log_config);

    // Execute the command
    match execute_command(cli.command, cli.quiet) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
