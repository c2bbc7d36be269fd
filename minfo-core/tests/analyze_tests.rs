use minfo_core::config::AnalyzeConfigBuilder;
use minfo_core::engine::MockEngine;
use minfo_core::engine::mock::{MockCall, MockFixture};
use minfo_core::{
    AnalyzeConfig, CoreError, StreamKind, analyze_file_with, analyze_path_with, engine_version_with,
    stream_summary_with, supported_output_formats_with,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

// --- Test Helper Functions ---

fn write_sample(dir: &Path) -> PathBuf {
    let path = dir.join("sample.mp4");
    let bytes = MockFixture::new()
        .track("General", &[("Title", "Sample")])
        .track("Video", &[("Format", "AVC"), ("Width", "1920"), ("Height", "1080")])
        .track("Audio", &[("Format", "AAC"), ("Channels", "6")])
        .to_bytes();
    fs::write(&path, bytes).expect("failed to write fixture");
    path
}

fn sample() -> (TempDir, PathBuf) {
    let dir = tempdir().expect("failed to create temp dir");
    let path = write_sample(dir.path());
    (dir, path)
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

// --- analyze ---

#[cfg(unix)]
#[test]
fn test_analyze_descriptor_mixml() -> Result<(), Box<dyn std::error::Error>> {
    use minfo_core::analyze_with;
    use std::os::fd::AsFd;

    let (_dir, path) = sample();
    let file = File::open(&path)?;
    let engine = MockEngine::new();

    let report = analyze_with(&engine, file.as_fd(), "sample.mp4", Some("MIXML"))?;

    assert!(report.starts_with("<?xml"));
    assert!(report.contains("<MediaInfo"));
    assert_eq!(count_occurrences(&report, "<track type=\"Video\">"), 1);
    assert_eq!(count_occurrences(&report, "<track type=\"Audio\">"), 1);
    assert!(report.contains("<media ref=\"sample.mp4\">"));
    assert_eq!(engine.live_handles(), 0);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_analyze_descriptor_keeps_caller_offset() -> Result<(), Box<dyn std::error::Error>> {
    use minfo_core::analyze_with;
    use std::io::{Seek, SeekFrom};
    use std::os::fd::AsFd;

    let (_dir, path) = sample();
    let mut file = File::open(&path)?;
    file.seek(SeekFrom::Start(3))?;
    let engine = MockEngine::new();

    let report = analyze_with(&engine, file.as_fd(), "sample.mp4", None)?;

    assert_eq!(count_occurrences(&report, "<track type=\"Video\">"), 1);
    assert_eq!(file.stream_position()?, 3);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_analyze_descriptor_defaults_to_mixml() -> Result<(), Box<dyn std::error::Error>> {
    use minfo_core::analyze_with;
    use std::os::fd::AsFd;

    let (_dir, path) = sample();
    let file = File::open(&path)?;
    let engine = MockEngine::new();

    let report = analyze_with(&engine, file.as_fd(), "sample.mp4", None)?;
    assert!(report.starts_with("<?xml"));
    assert_eq!(engine.option_value("Inform").as_deref(), Some("MIXML"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_analyze_unrecognized_descriptor_is_empty() -> Result<(), Box<dyn std::error::Error>> {
    use minfo_core::analyze_with;
    use std::os::fd::AsFd;

    let dir = tempdir()?;
    let path = dir.path().join("notes.txt");
    fs::write(&path, "plain text, no media here")?;
    let file = File::open(&path)?;
    let engine = MockEngine::new();

    let report = analyze_with(&engine, file.as_fd(), "notes.txt", Some("JSON"))?;
    assert_eq!(report, "");
    assert_eq!(engine.live_handles(), 0);
    Ok(())
}

#[test]
fn test_analyze_path_json() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample();
    let engine = MockEngine::new();

    let report = analyze_path_with(&engine, &path, &AnalyzeConfig::with_format("JSON"))?;
    let document: serde_json::Value = serde_json::from_str(&report)?;
    let tracks = document["media"]["track"].as_array().expect("track array");

    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks[0]["@type"], "General");
    assert_eq!(tracks[0]["Title"], "Sample");
    assert_eq!(tracks[1]["@type"], "Video");
    assert_eq!(tracks[1]["Width"], "1920");
    assert_eq!(tracks[2]["Channels"], "6");
    Ok(())
}

#[test]
fn test_analyze_file_streams_bytes() -> Result<(), Box<dyn std::error::Error>> {
    use std::io::{Seek, SeekFrom};

    let (_dir, path) = sample();
    let mut file = File::open(&path)?;
    file.seek(SeekFrom::Start(5))?;
    let engine = MockEngine::new();
    let config = AnalyzeConfigBuilder::new()
        .output_format("Text")
        .read_chunk_size(16)
        .build();

    let report = analyze_file_with(&engine, &file, "renamed.mp4", &config)?;
    assert!(report.starts_with("General\n"));
    assert_eq!(file.stream_position()?, 5);
    assert!(report.contains("renamed.mp4"));
    assert!(
        engine
            .calls()
            .iter()
            .any(|call| matches!(call, MockCall::OpenBufferInit { .. }))
    );
    Ok(())
}

#[test]
fn test_missing_path_is_empty_unless_strict() {
    let engine = MockEngine::new();
    let missing = "/no/such/dir/movie.mkv";

    let report = analyze_path_with(&engine, missing, &AnalyzeConfig::default()).unwrap();
    assert_eq!(report, "");

    let strict = AnalyzeConfigBuilder::new().strict(true).build();
    let result = analyze_path_with(&engine, missing, &strict);
    assert!(matches!(result, Err(CoreError::OpenFailed(name)) if name == missing));

    assert_eq!(engine.created(), 2);
    assert_eq!(engine.live_handles(), 0);
}

#[test]
fn test_extra_options_reach_engine() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample();
    let engine = MockEngine::new();
    let config = AnalyzeConfigBuilder::new()
        .complete(true)
        .language("raw")
        .option("ParseSpeed", "0.5")
        .build();

    analyze_path_with(&engine, &path, &config)?;

    assert_eq!(engine.option_value("Complete").as_deref(), Some("1"));
    assert_eq!(engine.option_value("Language").as_deref(), Some("raw"));
    assert_eq!(engine.option_value("ParseSpeed").as_deref(), Some("0.5"));
    Ok(())
}

#[test]
fn test_language_resets_between_helpers() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample();
    let engine = MockEngine::new();

    let raw = AnalyzeConfigBuilder::new().language("raw").complete(true).build();
    analyze_path_with(&engine, &path, &raw)?;
    assert_eq!(engine.option_value("Language").as_deref(), Some("raw"));

    analyze_path_with(&engine, &path, &AnalyzeConfig::default())?;
    assert_eq!(engine.option_value("Language").as_deref(), Some(""));
    assert_eq!(engine.option_value("Complete").as_deref(), Some(""));
    Ok(())
}

#[test]
fn test_invalid_option_is_rejected_before_allocation() {
    let engine = MockEngine::new();
    let config = AnalyzeConfigBuilder::new().option("Inform", "MI\0XML").build();
    let result = analyze_path_with(&engine, "/tmp/x.mkv", &config);
    assert!(matches!(result, Err(CoreError::InvalidArgument(_))));
    assert_eq!(engine.created(), 0);
}

#[test]
fn test_allocation_failure_is_an_error() {
    let engine = MockEngine::with_capacity(0);
    let result = analyze_path_with(&engine, "/tmp/x.mkv", &AnalyzeConfig::default());
    assert!(matches!(result, Err(CoreError::Allocation)));
}

#[test]
fn test_concurrent_helpers_keep_their_format() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 25;

    let (_dir, path) = sample();
    let engine = MockEngine::new();

    std::thread::scope(|scope| {
        for t in 0..THREADS {
            let (engine, path) = (&engine, &path);
            scope.spawn(move || {
                let json = t % 2 == 0;
                let config = AnalyzeConfig::with_format(if json { "JSON" } else { "MIXML" });
                for _ in 0..ROUNDS {
                    let report = analyze_path_with(engine, path, &config).unwrap();
                    if json {
                        assert!(report.trim_start().starts_with('{'), "{report}");
                    } else {
                        assert!(report.starts_with("<?xml"), "{report}");
                    }
                }
            });
        }
    });

    assert_eq!(engine.created(), THREADS * ROUNDS);
    assert_eq!(engine.live_handles(), 0);
}

// --- Stream summary ---

#[test]
fn test_stream_summary_counts() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample();
    let engine = MockEngine::new();

    let summary = stream_summary_with(&engine, &path)?;
    assert_eq!(summary.count(StreamKind::General), 1);
    assert_eq!(summary.count(StreamKind::Video), 1);
    assert_eq!(summary.count(StreamKind::Audio), 1);
    assert_eq!(summary.count(StreamKind::Text), 0);
    assert!(summary.name.ends_with("sample.mp4"));

    let json = serde_json::to_value(&summary)?;
    assert_eq!(json["video"], 1);
    Ok(())
}

#[test]
fn test_stream_summary_missing_file() {
    let engine = MockEngine::new();
    let result = stream_summary_with(&engine, "/no/such/file.mkv");
    assert!(matches!(result, Err(CoreError::OpenFailed(_))));
    assert_eq!(engine.live_handles(), 0);
}

// --- Engine metadata ---

#[test]
fn test_engine_version_is_bare_number() {
    let engine = MockEngine::new();
    let version = engine_version_with(&engine).unwrap();
    assert_eq!(version, "24.06");
    assert!(!version.starts_with("MediaInfoLib"));
    assert_eq!(engine.live_handles(), 0);
}

#[test]
fn test_output_formats_list() {
    let engine = MockEngine::new();
    let formats = supported_output_formats_with(&engine).unwrap();
    let names: Vec<&str> = formats.split(',').collect();
    assert!(names.contains(&"MIXML"));
    assert!(names.contains(&"JSON"));
    assert_eq!(engine.live_handles(), 0);
}
