// ============================================================================
// minfo-cli/src/main.rs
// ============================================================================
//
// MINFO CLI: Main entry point for the minfo command
//
// Parses the command line, installs the logger and runs the selected
// subcommand. On failure the full error chain is printed to stderr and the
// process exits with the status chosen by `minfo_cli::exit_code`.

use clap::Parser;
use console::style;
use minfo_cli::{Cli, exit_code, logging, run};
use std::process;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        log::debug!("Command failed: {:?}", e);
        eprintln!("{} {e:#}", style("Error:").for_stderr().red().bold());
        process::exit(exit_code(&e));
    }
}
