//! Implementation of the 'version' and 'formats' subcommands: facts about the
//! loaded MediaInfo library rather than about a media file.

use crate::error::CliResult;

use anyhow::Context;
use minfo_core::{Engine, engine_version_with, supported_output_formats_with};

use std::io::Write;

/// Prints the library version without its "MediaInfoLib - v" prefix.
pub fn run_version(engine: &dyn Engine, out: &mut dyn Write) -> CliResult<()> {
    let version = engine_version_with(engine).context("Failed to query the library version")?;
    writeln!(out, "{version}")?;
    Ok(())
}

/// Prints the supported report formats, one per line.
pub fn run_formats(engine: &dyn Engine, out: &mut dyn Write) -> CliResult<()> {
    let formats =
        supported_output_formats_with(engine).context("Failed to query the output formats")?;
    for format in split_formats(&formats) {
        writeln!(out, "{format}")?;
    }
    Ok(())
}

fn split_formats(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|f| !f.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use minfo_core::engine::MockEngine;

    #[test]
    fn test_split_formats_skips_blanks() {
        let formats: Vec<_> = split_formats("Text, MIXML,,JSON ").collect();
        assert_eq!(formats, ["Text", "MIXML", "JSON"]);
    }

    #[test]
    fn test_version_output() {
        let engine = MockEngine::new();
        let mut out = Vec::new();
        run_version(&engine, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "24.06\n");
    }
}
