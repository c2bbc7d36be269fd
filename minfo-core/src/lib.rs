//! Safe binding to the MediaInfo analysis engine.
//!
//! This crate owns the engine's opaque analysis handles, marshals typed
//! requests into the engine's C calling convention and offers one-shot
//! helpers for the common "analyze and dump" case.
//!
//! - [`Session`] wraps exactly one native handle and exposes every call the
//!   engine accepts. The handle is released exactly once, when the session
//!   is destroyed or dropped.
//! - The [`analyze`](mod@crate::analyze) module holds the convenience helpers.
//! - [`engine`] describes the raw call surface and provides the real
//!   library ([`engine::MediaInfoLib`]). The `mock` feature adds an
//!   in-process fixture engine, `engine::MockEngine`.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use minfo_core::{Session, StreamKind};
//!
//! let mut session = Session::native()?;
//! session.configure("Inform", "JSON");
//! if session.open_by_path("/path/to/movie.mkv") {
//!     let videos = session.stream_count(StreamKind::Video, None);
//!     let width = session.get(StreamKind::Video, 0, "Width");
//!     println!("{videos} video stream(s), first is {width} px wide");
//!     println!("{}", session.report());
//! }
//! session.close();
//! # Ok::<(), minfo_core::CoreError>(())
//! ```

pub mod analyze;
pub mod config;
pub mod engine;
pub mod error;
pub mod kinds;
pub mod session;

// Re-exports for public API
pub use analyze::{
    StreamSummary, analyze_file_with, analyze_path, analyze_path_with, engine_version,
    engine_version_with, stream_summary_with, supported_output_formats,
    supported_output_formats_with,
};
#[cfg(unix)]
pub use analyze::{analyze, analyze_descriptor_with, analyze_with};
pub use config::{AnalyzeConfig, AnalyzeConfigBuilder, EngineOption};
pub use engine::{BufferStatus, Engine};
pub use error::{CoreError, CoreResult};
pub use kinds::{InfoKind, StreamKind};
pub use session::{Lifecycle, Session};
