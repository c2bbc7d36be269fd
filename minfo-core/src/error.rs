// ============================================================================
// minfo-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error types for the minfo core library
//
// Only conditions the engine itself never reports live here. Soft failures
// of the native engine (a failed open, an empty query result) are values,
// not errors, and are returned as such by `Session`.
//
// KEY COMPONENTS:
// - CoreError: Failures of the binding layer and the convenience helpers
// - CoreResult: Result alias used throughout the crate
// - Helper constructors for frequently built variants

// ---- External crate imports ----
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors raised by the binding layer.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The engine library, or one of its entry points, could not be loaded.
    #[error("Failed to load engine library '{name}': {source}")]
    LibraryLoad {
        name: String,
        #[source]
        source: libloading::Error,
    },

    /// None of the candidate library names could be loaded.
    #[error("Engine library not found (tried: {0})")]
    LibraryNotFound(String),

    /// The engine refused to allocate a new analysis handle.
    #[error("Engine could not allocate an analysis handle")]
    Allocation,

    /// Strict convenience tier only: the source could not be opened.
    #[error("Failed to open media source: {0}")]
    OpenFailed(String),

    /// A value that cannot cross the C boundary (interior NUL, empty format).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed configuration text such as an option without `=`.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for minfo core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

// ============================================================================
// HELPER CONSTRUCTORS
// ============================================================================

/// Builds a `LibraryLoad` error for the given library or symbol name.
pub(crate) fn library_load_error(name: impl Into<String>, source: libloading::Error) -> CoreError {
    CoreError::LibraryLoad {
        name: name.into(),
        source,
    }
}

/// Builds an `InvalidArgument` error for a string containing a NUL byte.
pub(crate) fn interior_nul_error(what: &str, value: &str) -> CoreError {
    CoreError::InvalidArgument(format!(
        "{what} contains an interior NUL byte: {value:?}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interior_nul_message_names_the_field() {
        let err = interior_nul_error("option value", "MI\0XML");
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid argument: option value"));
        assert!(msg.contains("\\0"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::Io(_)));
        assert_eq!(err.to_string(), "IO error: gone");
    }
}
