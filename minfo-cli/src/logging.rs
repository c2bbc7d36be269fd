// ============================================================================
// minfo-cli/src/logging.rs
// ============================================================================
//
// LOGGING: env_logger setup for the minfo command
//
// Reports go to stdout, so log records are written to stderr where they can
// be separated from the report.
//
// USAGE:
// - default: warnings and errors only
// - --verbose: debug records from minfo and minfo-core
// - RUST_LOG=<filter>: overrides both, e.g. RUST_LOG=minfo_core=trace

use env_logger::{Builder, Env, Target};
use std::io::Write;

/// Filter used when `RUST_LOG` is not set.
fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

/// Returns the current local timestamp formatted for log records.
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Installs the global logger. Calling it twice is harmless; the second
/// call leaves the first logger in place.
pub fn init(verbose: bool) {
    let result = Builder::from_env(Env::default().default_filter_or(default_filter(verbose)))
        .target(Target::Stderr)
        .format(|buf, record| {
            let level = match record.level() {
                log::Level::Error => "ERROR",
                log::Level::Warn => "WARN ",
                log::Level::Info => "INFO ",
                log::Level::Debug => "DEBUG",
                log::Level::Trace => "TRACE",
            };
            writeln!(buf, "{} {} {}", get_timestamp(), level, record.args())
        })
        .try_init();

    if result.is_ok() {
        log::debug!("Logger initialized (max level {})", log::max_level());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(false), "warn");
        assert_eq!(default_filter(true), "debug");
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = get_timestamp();
        // "YYYY-MM-DD HH:MM:SS.mmm"
        assert_eq!(ts.len(), 23);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
    }
}
