//! Tests against a real libmediainfo.
//!
//! Ignored by default. Run with `--ignored` on a machine where the library is
//! installed (or `MINFO_LIBRARY` points at it).

use minfo_core::engine::MediaInfoLib;
use minfo_core::{Session, StreamKind, engine_version, supported_output_formats};

#[test]
#[ignore = "requires libmediainfo"]
fn test_native_version_has_no_prefix() {
    let version = engine_version().unwrap();
    assert!(!version.is_empty());
    assert!(!version.starts_with("MediaInfoLib"));
    assert!(version.chars().next().is_some_and(|c| c.is_ascii_digit()));
}

#[test]
#[ignore = "requires libmediainfo"]
fn test_native_output_formats_include_mixml() {
    let formats = supported_output_formats().unwrap();
    assert!(formats.split(',').any(|f| f.trim().eq_ignore_ascii_case("MIXML")));
}

#[test]
#[ignore = "requires libmediainfo"]
fn test_native_missing_file_fails_softly() {
    let mut session = Session::native().unwrap();
    assert!(!session.open_by_path("/this/path/does/not/exist.mkv"));
    assert_eq!(session.get(StreamKind::General, 0, "Format"), "");
    assert_eq!(session.stream_count(StreamKind::Video, None), 0);
}

#[test]
#[ignore = "requires libmediainfo"]
fn test_native_sessions_are_released() {
    let engine = MediaInfoLib::shared().unwrap();
    for _ in 0..1_000 {
        let mut session = Session::create(engine).unwrap();
        session.configure("Inform", "MIXML");
        session.destroy();
    }
}
