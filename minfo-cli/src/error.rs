// ============================================================================
// minfo-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Result alias and exit statuses
//
// Commands return anyhow errors with context attached at the command
// boundary. The underlying CoreError, when there is one, decides the exit
// status so scripts can tell a missing library from an unreadable file.
//
// KEY COMPONENTS:
// - CliResult: Type alias for CLI operations
// - exit_code: Maps a failure to the process exit status

use minfo_core::CoreError;

/// Type alias for CLI results.
pub type CliResult<T> = anyhow::Result<T>;

/// Generic failure.
pub const EXIT_FAILURE: i32 = 1;

/// The media source could not be opened or yielded no value.
pub const EXIT_OPEN_FAILED: i32 = 2;

/// The MediaInfo library could not be loaded.
pub const EXIT_LIBRARY: i32 = 3;

/// Exit status for a failed command.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<CoreError>() {
        Some(CoreError::LibraryLoad { .. } | CoreError::LibraryNotFound(_)) => EXIT_LIBRARY,
        Some(CoreError::OpenFailed(_)) => EXIT_OPEN_FAILED,
        _ => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_code_sees_through_context() {
        let result: Result<(), CoreError> = Err(CoreError::OpenFailed("a.mkv".into()));
        let error = result.context("Analysis of 'a.mkv' failed").unwrap_err();
        assert_eq!(exit_code(&error), EXIT_OPEN_FAILED);

        let error = anyhow::Error::new(CoreError::LibraryNotFound("libmediainfo.so".into()));
        assert_eq!(exit_code(&error), EXIT_LIBRARY);

        assert_eq!(exit_code(&anyhow::anyhow!("other")), EXIT_FAILURE);
    }
}
