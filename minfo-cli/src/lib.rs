// ============================================================================
// minfo-cli/src/lib.rs
// ============================================================================
//
// Library portion of the minfo CLI application.
// Contains argument definitions, engine selection and command logic.

pub mod cli;
pub mod commands;
pub mod engine;
pub mod error;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::{AnalyzeArgs, Cli, Commands, CountArgs, EngineKind, GetArgs};
pub use engine::SelectedEngine;
pub use error::{CliResult, exit_code};

use std::io::{self, Write};

/// Runs one parsed command line, printing results to stdout.
pub fn run(cli: Cli) -> CliResult<()> {
    let selected = SelectedEngine::select(cli.engine, cli.library.as_deref())?;
    let engine = selected.as_engine();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(engine, args, &mut out)?,
        Commands::Version => commands::info::run_version(engine, &mut out)?,
        Commands::Formats => commands::info::run_formats(engine, &mut out)?,
        Commands::Count(args) => commands::count::run_count(engine, args, &mut out)?,
        Commands::Get(args) => commands::get::run_get(engine, args, &mut out)?,
    }
    out.flush()?;
    Ok(())
}
