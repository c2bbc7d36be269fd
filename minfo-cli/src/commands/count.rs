//! Implementation of the 'count' subcommand.

use crate::cli::CountArgs;
use crate::error::CliResult;

use anyhow::Context;
use minfo_core::{Engine, StreamKind, StreamSummary, stream_summary_with};

use std::io::Write;

/// Main entry point for the count command.
pub fn run_count(engine: &dyn Engine, args: CountArgs, out: &mut dyn Write) -> CliResult<()> {
    let summary = stream_summary_with(engine, &args.input)
        .with_context(|| format!("Failed to count streams in '{}'", args.input.display()))?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
    } else {
        write_table(&summary, out)?;
    }
    Ok(())
}

fn write_table(summary: &StreamSummary, out: &mut dyn Write) -> CliResult<()> {
    for kind in StreamKind::ALL {
        writeln!(out, "{:<8} {}", format!("{kind}:"), summary.count(kind))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lists_every_kind() {
        let summary = StreamSummary {
            name: "a.mkv".to_string(),
            general: 1,
            audio: 2,
            ..StreamSummary::default()
        };
        let mut out = Vec::new();
        write_table(&summary, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count(), StreamKind::ALL.len());
        assert!(text.starts_with("General: 1\n"));
        assert!(text.contains("Audio:   2\n"));
    }
}
