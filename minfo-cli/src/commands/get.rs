//! Implementation of the 'get' subcommand.
//!
//! Drives a `Session` directly: open, one query (or a listing of the whole
//! stream), close. An empty answer from the library is reported as an error
//! so that scripts can rely on the exit status.

use crate::cli::GetArgs;
use crate::error::CliResult;

use anyhow::{Context, bail};
use minfo_core::{CoreError, Engine, Session};

use std::io::Write;

/// Main entry point for the get command.
pub fn run_get(engine: &dyn Engine, args: GetArgs, out: &mut dyn Write) -> CliResult<()> {
    let input = args.input.display().to_string();
    let mut session = Session::create(engine)?;
    if !session.open_by_path(&args.input) {
        return Err(CoreError::OpenFailed(input)).context("Could not read media file");
    }

    let (kind, stream) = (args.kind, args.stream);
    match (&args.param, args.index) {
        (Some(name), _) => {
            let value = session.query_by_name(kind, stream, name, args.info, args.search);
            if value.is_empty() {
                bail!("No {} for '{}' in {} stream {} of '{}'", args.info, name, kind, stream, input);
            }
            writeln!(out, "{value}")?;
        }
        (None, Some(index)) => {
            let value = session.query_by_index(kind, stream, index, args.info);
            if value.is_empty() {
                bail!("No parameter {} in {} stream {} of '{}'", index, kind, stream, input);
            }
            writeln!(out, "{value}")?;
        }
        (None, None) => {
            let parameters = session.parameters(kind, stream);
            if parameters.is_empty() {
                bail!("No {} stream {} in '{}'", kind, stream, input);
            }
            let width = parameters.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
            for (name, value) in parameters {
                writeln!(out, "{name:<width$} : {value}")?;
            }
        }
    }

    session.close();
    Ok(())
}
