//! Configuration structures and constants for the minfo-core library.
//!
//! An [`AnalyzeConfig`] describes how the convenience layer drives a session:
//! which report format to select, which other engine options to set first,
//! and whether a failed open is an error. Every option it sets is
//! engine-global; see [`crate::Session::configure`].

mod builder;

use std::fmt;
use std::str::FromStr;

pub use builder::AnalyzeConfigBuilder;

use crate::error::{CoreError, CoreResult};

// Default constants

/// Report format used when none is given. Structured XML, root element
/// `MediaInfo`.
pub const DEFAULT_OUTPUT_FORMAT: &str = "MIXML";

/// Option selecting the report format.
pub const INFORM_OPTION: &str = "Inform";

/// Option that makes reports include every parameter instead of the
/// common subset.
pub const COMPLETE_OPTION: &str = "Complete";

/// Option selecting the language of report labels.
pub const LANGUAGE_OPTION: &str = "Language";

/// Read-only option returning the engine version string.
pub const VERSION_OPTION: &str = "Info_Version";

/// Read-only option returning the comma-separated output format list.
pub const OUTPUT_FORMATS_OPTION: &str = "Info_OutputFormats";

/// Option carrying the source name for buffer-based opens.
pub const FILE_NAME_OPTION: &str = "File_FileName";

/// Prefix of the `Info_Version` answer, stripped by `engine_version`.
pub const VERSION_PREFIX: &str = "MediaInfoLib - v";

/// Bytes read from a source per `Open_Buffer_Continue` call.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// One engine option as a (name, value) pair.
///
/// Parses from `Name=Value` text; the value may be empty (`Name=`) and may
/// itself contain `=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOption {
    pub name: String,
    pub value: String,
}

impl EngineOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Config("option name is empty".to_string()));
        }
        if self.name.contains('\0') {
            return Err(crate::error::interior_nul_error("option name", &self.name));
        }
        if self.value.contains('\0') {
            return Err(crate::error::interior_nul_error("option value", &self.value));
        }
        Ok(())
    }
}

impl FromStr for EngineOption {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| CoreError::Config(format!("expected Name=Value, got '{s}'")))?;
        let option = EngineOption::new(name.trim(), value);
        option.validate()?;
        Ok(option)
    }
}

impl fmt::Display for EngineOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// How the convenience layer configures and drives a session.
///
/// # Examples
///
/// ```rust
/// use minfo_core::config::AnalyzeConfigBuilder;
///
/// let config = AnalyzeConfigBuilder::new()
///     .output_format("JSON")
///     .complete(true)
///     .option("ParseSpeed", "0.5")
///     .build();
/// assert_eq!(config.engine_options().len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeConfig {
    /// Value for the `Inform` option
    pub output_format: String,

    /// Whether to set `Complete=1`
    pub complete: bool,

    /// Optional report language (`Language` option)
    pub language: Option<String>,

    /// Additional options applied after the ones above, in order
    pub extra_options: Vec<EngineOption>,

    /// Whether a failed open is reported as `CoreError::OpenFailed`
    /// instead of an empty report
    pub strict: bool,

    /// Bytes per feed when streaming from a reader or descriptor
    pub read_chunk_size: usize,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            complete: false,
            language: None,
            extra_options: Vec::new(),
            strict: false,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl AnalyzeConfig {
    /// Default configuration with a different report format.
    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            output_format: format.into(),
            ..Self::default()
        }
    }

    /// Options in the order they are applied to the engine.
    ///
    /// `Complete` and `Language` are always emitted, empty when unset, so
    /// that a previous helper's setting does not leak into this one through
    /// the engine-global state. An empty `Language` restores the engine's
    /// default labels.
    pub fn engine_options(&self) -> Vec<EngineOption> {
        let mut options = vec![
            EngineOption::new(INFORM_OPTION, self.output_format.clone()),
            EngineOption::new(COMPLETE_OPTION, if self.complete { "1" } else { "" }),
            EngineOption::new(LANGUAGE_OPTION, self.language.clone().unwrap_or_default()),
        ];
        options.extend(self.extra_options.iter().cloned());
        options
    }

    /// Checks that every value can cross the C boundary.
    pub fn validate(&self) -> CoreResult<()> {
        if self.output_format.trim().is_empty() {
            return Err(CoreError::InvalidArgument(
                "output format is empty".to_string(),
            ));
        }
        if self.read_chunk_size == 0 {
            return Err(CoreError::InvalidArgument(
                "read chunk size must be greater than zero".to_string(),
            ));
        }
        self.engine_options().iter().try_for_each(EngineOption::validate)
    }
}
