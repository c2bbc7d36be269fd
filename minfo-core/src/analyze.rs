//! One-shot analysis helpers.
//!
//! Each helper creates a [`Session`], drives it through
//! configure → open → report → close and returns a single result. The
//! session is released when the helper returns, on the error paths too.
//!
//! The `_with` variants take any [`Engine`]; the plain variants use the
//! process-wide libmediainfo from [`MediaInfoLib::shared`].
//!
//! Engine options are global, so two helpers running concurrently with
//! different formats could otherwise see each other's `Inform` value. The
//! helpers therefore hold [`OPTIONS_LOCK`] from their first `configure` until
//! the report has been read. Code driving a [`Session`] directly gets no such
//! protection.

use std::fs::File;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(unix)]
use std::os::fd::BorrowedFd;

use serde::Serialize;

use crate::config::{AnalyzeConfig, OUTPUT_FORMATS_OPTION, VERSION_OPTION, VERSION_PREFIX};
use crate::engine::{Engine, MediaInfoLib};
use crate::error::{CoreError, CoreResult};
use crate::kinds::StreamKind;
use crate::session::Session;

/// Serializes the configure→report window of the helpers in this module.
pub static OPTIONS_LOCK: Mutex<()> = Mutex::new(());

fn options_guard() -> MutexGuard<'static, ()> {
    OPTIONS_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Number of streams of each kind found in one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub name: String,
    pub general: usize,
    pub video: usize,
    pub audio: usize,
    pub text: usize,
    pub other: usize,
    pub image: usize,
    pub menu: usize,
}

impl StreamSummary {
    pub fn count(&self, kind: StreamKind) -> usize {
        match kind {
            StreamKind::General => self.general,
            StreamKind::Video => self.video,
            StreamKind::Audio => self.audio,
            StreamKind::Text => self.text,
            StreamKind::Other => self.other,
            StreamKind::Image => self.image,
            StreamKind::Menu => self.menu,
        }
    }

    fn set(&mut self, kind: StreamKind, count: usize) {
        let slot = match kind {
            StreamKind::General => &mut self.general,
            StreamKind::Video => &mut self.video,
            StreamKind::Audio => &mut self.audio,
            StreamKind::Text => &mut self.text,
            StreamKind::Other => &mut self.other,
            StreamKind::Image => &mut self.image,
            StreamKind::Menu => &mut self.menu,
        };
        *slot = count;
    }
}

/// Applies every option of `config` to the engine through `session`.
fn apply_config<E: Engine + ?Sized>(session: &mut Session<'_, E>, config: &AnalyzeConfig) {
    for option in config.engine_options() {
        let answer = session.configure(&option.name, &option.value);
        if !answer.is_empty() {
            log::debug!("Engine answered {} with: {}", option, answer);
        }
    }
}

/// Reads the report, closes the source and applies the strict policy.
fn finish_report<E: Engine + ?Sized>(
    session: &mut Session<'_, E>,
    opened: bool,
    name: &str,
    config: &AnalyzeConfig,
) -> CoreResult<String> {
    if !opened {
        log::warn!("Engine could not open {}", name);
        if config.strict {
            return Err(CoreError::OpenFailed(name.to_string()));
        }
    }
    let report = session.report();
    session.close();
    Ok(report)
}

// ============================================================================
// REPORTS
// ============================================================================

/// Analyzes an open file descriptor and returns the report in `format`
/// (`"MIXML"` unless told otherwise), using libmediainfo.
///
/// The descriptor stays owned by the caller and keeps its file offset.
/// `name` is informational.
#[cfg(unix)]
pub fn analyze(fd: BorrowedFd<'_>, name: &str, format: Option<&str>) -> CoreResult<String> {
    analyze_with(MediaInfoLib::shared()?, fd, name, format)
}

/// [`analyze`] on a specific engine.
#[cfg(unix)]
pub fn analyze_with<E: Engine + ?Sized>(
    engine: &E,
    fd: BorrowedFd<'_>,
    name: &str,
    format: Option<&str>,
) -> CoreResult<String> {
    let config = match format {
        Some(format) => AnalyzeConfig::with_format(format),
        None => AnalyzeConfig::default(),
    };
    analyze_descriptor_with(engine, fd, name, &config)
}

/// Descriptor analysis with a full configuration.
#[cfg(unix)]
pub fn analyze_descriptor_with<E: Engine + ?Sized>(
    engine: &E,
    fd: BorrowedFd<'_>,
    name: &str,
    config: &AnalyzeConfig,
) -> CoreResult<String> {
    config.validate()?;
    let mut session = Session::create(engine)?;
    let _guard = options_guard();
    apply_config(&mut session, config);
    let opened = session.open_by_descriptor_chunked(fd, name, config.read_chunk_size);
    finish_report(&mut session, opened, name, config)
}

/// Analyzes a file by path with libmediainfo.
pub fn analyze_path(path: impl AsRef<Path>, config: &AnalyzeConfig) -> CoreResult<String> {
    analyze_path_with(MediaInfoLib::shared()?, path, config)
}

/// [`analyze_path`] on a specific engine.
pub fn analyze_path_with<E: Engine + ?Sized>(
    engine: &E,
    path: impl AsRef<Path>,
    config: &AnalyzeConfig,
) -> CoreResult<String> {
    let path = path.as_ref();
    config.validate()?;
    let mut session = Session::create(engine)?;
    let _guard = options_guard();
    apply_config(&mut session, config);
    let opened = session.open_by_path(path);
    finish_report(&mut session, opened, &path.display().to_string(), config)
}

/// Analyzes a file by streaming its bytes to the engine instead of letting
/// the engine open it. Useful for sources the engine cannot address by
/// name. The file's offset is left where the caller had it.
pub fn analyze_file_with<E: Engine + ?Sized>(
    engine: &E,
    file: &File,
    name: &str,
    config: &AnalyzeConfig,
) -> CoreResult<String> {
    config.validate()?;
    let mut session = Session::create(engine)?;
    let _guard = options_guard();
    apply_config(&mut session, config);
    let opened = session.open_file_chunked(file, name, config.read_chunk_size);
    finish_report(&mut session, opened, name, config)
}

// ============================================================================
// STREAM COUNTS
// ============================================================================

/// Counts the streams of every kind in the file at `path`.
pub fn stream_summary_with<E: Engine + ?Sized>(
    engine: &E,
    path: impl AsRef<Path>,
) -> CoreResult<StreamSummary> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let mut session = Session::create(engine)?;
    if !session.open_by_path(path) {
        return Err(CoreError::OpenFailed(name));
    }
    let mut summary = StreamSummary {
        name,
        ..StreamSummary::default()
    };
    for kind in StreamKind::ALL {
        summary.set(kind, session.stream_count(kind, None));
    }
    session.close();
    Ok(summary)
}

// ============================================================================
// ENGINE METADATA
// ============================================================================

/// Version of libmediainfo, e.g. "24.06".
pub fn engine_version() -> CoreResult<String> {
    engine_version_with(MediaInfoLib::shared()?)
}

/// Version reported by `engine`, with the `"MediaInfoLib - v"` prefix
/// removed.
pub fn engine_version_with<E: Engine + ?Sized>(engine: &E) -> CoreResult<String> {
    let mut session = Session::create(engine)?;
    let raw = session.configure_get(VERSION_OPTION);
    Ok(raw.replace(VERSION_PREFIX, ""))
}

/// Comma-separated list of report formats libmediainfo can produce.
pub fn supported_output_formats() -> CoreResult<String> {
    supported_output_formats_with(MediaInfoLib::shared()?)
}

pub fn supported_output_formats_with<E: Engine + ?Sized>(engine: &E) -> CoreResult<String> {
    let mut session = Session::create(engine)?;
    Ok(session.configure_get(OUTPUT_FORMATS_OPTION))
}
