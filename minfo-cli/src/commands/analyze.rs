//! Implementation of the 'analyze' subcommand.
//!
//! Builds an `AnalyzeConfig` from the arguments and hands the file to the
//! minfo-core convenience layer, either by path or by streaming its bytes.

use crate::cli::AnalyzeArgs;
use crate::error::CliResult;

use anyhow::Context;
use minfo_core::{AnalyzeConfig, AnalyzeConfigBuilder, Engine, analyze_file_with, analyze_path_with};

use std::fs::{self, File};
use std::io::Write;

use log::{debug, info, warn};

/// Creates the analysis configuration from CLI arguments.
pub fn create_analyze_config(args: &AnalyzeArgs) -> AnalyzeConfig {
    let mut builder = AnalyzeConfigBuilder::new()
        .output_format(args.format.clone())
        .complete(args.complete)
        .options(args.options.iter().cloned())
        .strict(args.strict);
    if let Some(language) = &args.language {
        builder = builder.language(language.clone());
    }
    builder.build()
}

/// Main entry point for the analyze command.
pub fn run_analyze(engine: &dyn Engine, args: AnalyzeArgs, out: &mut dyn Write) -> CliResult<()> {
    let config = create_analyze_config(&args);
    let input = &args.input;
    debug!("Analyzing {} with {:?}", input.display(), config);

    let report = if args.stream {
        let file = File::open(input)
            .with_context(|| format!("Failed to open input file '{}'", input.display()))?;
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        analyze_file_with(engine, &file, &name, &config)
    } else {
        analyze_path_with(engine, input, &config)
    }
    .with_context(|| format!("Analysis of '{}' failed", input.display()))?;

    if report.is_empty() {
        warn!(
            "No report for '{}': the file could not be opened or its format is not recognized",
            input.display()
        );
    }

    match &args.output {
        Some(path) => {
            fs::write(path, &report)
                .with_context(|| format!("Failed to write report to '{}'", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => {
            out.write_all(report.as_bytes())?;
            if !report.is_empty() && !report.ends_with('\n') {
                writeln!(out)?;
            }
        }
    }
    Ok(())
}
