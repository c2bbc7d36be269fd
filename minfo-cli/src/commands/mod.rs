//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command. Every
//! command takes the selected engine and the stream to print results to.

/// Full report of one media file.
pub mod analyze;
/// Per-kind stream counts.
pub mod count;
/// Single field lookups.
pub mod get;
/// Library version and output formats.
pub mod info;
