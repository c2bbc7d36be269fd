// ============================================================================
// minfo-cli/src/cli.rs
// ============================================================================
//
// Defines the command-line argument structures using clap.

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use minfo_core::config::DEFAULT_OUTPUT_FORMAT;
use minfo_core::engine::library::LIBRARY_ENV;
use minfo_core::{EngineOption, InfoKind, StreamKind};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "minfo: Media file analysis",
    long_about = "Inspects media files with the MediaInfo library through the minfo-core binding."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path or file name of the MediaInfo shared library
    #[arg(long, global = true, value_name = "LIBRARY", env = LIBRARY_ENV)]
    pub library: Option<String>,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Analysis engine. `mock` reads minfo test fixtures instead of media.
    #[arg(long, global = true, value_enum, default_value_t = EngineKind::Native, hide = true)]
    pub engine: EngineKind,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    Native,
    Mock,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prints the full report for a media file
    Analyze(AnalyzeArgs),
    /// Prints the MediaInfo library version
    Version,
    /// Lists the report formats the library can produce
    Formats,
    /// Counts the streams of each kind in a media file
    Count(CountArgs),
    /// Reads single fields of one stream
    Get(GetArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Media file to analyze
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Report format (Text, MIXML, JSON, ...)
    #[arg(short, long, value_name = "FORMAT", env = "MINFO_FORMAT", default_value = DEFAULT_OUTPUT_FORMAT)]
    pub format: String,

    /// Include every parameter instead of the common subset
    #[arg(long)]
    pub complete: bool,

    /// Language of report labels (e.g. "raw")
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Extra engine option, repeatable
    #[arg(short = 'O', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<EngineOption>,

    /// Fail when the file cannot be opened instead of printing nothing
    #[arg(long)]
    pub strict: bool,

    /// Feed the file to the library in chunks instead of letting it open the path
    #[arg(long)]
    pub stream: bool,

    /// Write the report to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CountArgs {
    /// Media file to inspect
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Print the counts as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("field").args(["param", "index"])))]
pub struct GetArgs {
    /// Media file to inspect
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Stream kind (general, video, audio, text, other, image, menu)
    #[arg(short, long, value_name = "KIND", default_value = "general")]
    pub kind: StreamKind,

    /// Zero-based stream number within the kind
    #[arg(short, long, value_name = "N", default_value_t = 0)]
    pub stream: usize,

    /// Parameter name, e.g. Format or Width
    #[arg(short, long, value_name = "NAME")]
    pub param: Option<String>,

    /// Parameter position within the stream
    #[arg(long, value_name = "N")]
    pub index: Option<usize>,

    /// Which facet of the parameter to print
    #[arg(long, value_name = "INFO", default_value = "text")]
    pub info: InfoKind,

    /// How --param is matched (name, name-text)
    #[arg(long, value_name = "INFO", default_value = "name")]
    pub search: InfoKind,
}
