use assert_cmd::Command;
use minfo_core::engine::mock::MockFixture;
use predicates::prelude::*;
use predicates::str::contains;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

// Helper function to get the compiled binary, running on the mock engine
// with a clean environment.
fn minfo_cmd() -> Command {
    let mut cmd = Command::cargo_bin("minfo").expect("Failed to find minfo binary");
    cmd.env_remove("MINFO_FORMAT")
        .env_remove("MINFO_LIBRARY")
        .env_remove("RUST_LOG")
        .args(["--engine", "mock"]);
    cmd
}

fn write_sample(dir: &Path) -> PathBuf {
    let path = dir.join("sample.mp4");
    let bytes = MockFixture::new()
        .track("Video", &[("Format", "AVC"), ("Width", "1920"), ("Height", "1080")])
        .track("Audio", &[("Format", "AAC"), ("Channels", "2")])
        .to_bytes();
    fs::write(&path, bytes).expect("failed to write fixture");
    path
}

fn sample() -> (TempDir, PathBuf) {
    let dir = tempdir().expect("failed to create temp dir");
    let path = write_sample(dir.path());
    (dir, path)
}

// --- analyze ---

#[test]
fn test_analyze_prints_mixml_by_default() -> Result<(), Box<dyn Error>> {
    let (_dir, path) = sample();

    let output = minfo_cmd().arg("analyze").arg(&path).output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;

    assert!(stdout.starts_with("<?xml"));
    assert_eq!(stdout.matches("<track type=\"Video\">").count(), 1);
    assert_eq!(stdout.matches("<track type=\"Audio\">").count(), 1);
    Ok(())
}

#[test]
fn test_analyze_json_format() -> Result<(), Box<dyn Error>> {
    let (_dir, path) = sample();

    let output = minfo_cmd()
        .arg("analyze")
        .arg(&path)
        .args(["--format", "JSON"])
        .output()?;
    assert!(output.status.success());

    let document: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(document["media"]["track"][1]["Width"], "1920");
    Ok(())
}

#[test]
fn test_analyze_format_from_environment() -> Result<(), Box<dyn Error>> {
    let (_dir, path) = sample();

    minfo_cmd()
        .env("MINFO_FORMAT", "Text")
        .arg("analyze")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("General\n"));
    Ok(())
}

#[test]
fn test_analyze_stream_mode_uses_file_name() -> Result<(), Box<dyn Error>> {
    let (_dir, path) = sample();

    minfo_cmd()
        .arg("analyze")
        .arg(&path)
        .arg("--stream")
        .assert()
        .success()
        .stdout(contains("<CompleteName>sample.mp4</CompleteName>"));
    Ok(())
}

#[test]
fn test_analyze_writes_output_file() -> Result<(), Box<dyn Error>> {
    let (dir, path) = sample();
    let report = dir.path().join("report.json");

    minfo_cmd()
        .arg("analyze")
        .arg(&path)
        .args(["-f", "JSON", "-O", "ParseSpeed=1", "--output"])
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&report)?;
    assert!(written.contains("\"@type\": \"Video\""));
    Ok(())
}

#[test]
fn test_analyze_missing_file_is_empty() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let missing = dir.path().join("missing.mkv");

    minfo_cmd()
        .arg("analyze")
        .arg(&missing)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(contains("No report"));
    Ok(())
}

#[test]
fn test_analyze_missing_file_strict() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let missing = dir.path().join("missing.mkv");

    minfo_cmd()
        .arg("analyze")
        .arg(&missing)
        .arg("--strict")
        .assert()
        .code(2)
        .stderr(contains("Failed to open media source"));
    Ok(())
}

#[test]
fn test_analyze_rejects_malformed_option() -> Result<(), Box<dyn Error>> {
    let (_dir, path) = sample();

    minfo_cmd()
        .arg("analyze")
        .arg(&path)
        .args(["-O", "NoEqualsSign"])
        .assert()
        .failure()
        .stderr(contains("Name=Value"));
    Ok(())
}

// --- version / formats ---

#[test]
fn test_version_has_no_prefix() {
    minfo_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout("24.06\n");
}

#[test]
fn test_formats_one_per_line() {
    minfo_cmd()
        .arg("formats")
        .assert()
        .success()
        .stdout(contains("\nMIXML\n").and(contains("\nJSON\n")));
}

// --- count ---

#[test]
fn test_count_table() -> Result<(), Box<dyn Error>> {
    let (_dir, path) = sample();

    minfo_cmd()
        .arg("count")
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("Video:   1").and(contains("Text:    0")));
    Ok(())
}

#[test]
fn test_count_json() -> Result<(), Box<dyn Error>> {
    let (_dir, path) = sample();

    let output = minfo_cmd().arg("count").arg(&path).arg("--json").output()?;
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(summary["video"], 1);
    assert_eq!(summary["audio"], 1);
    assert_eq!(summary["menu"], 0);
    Ok(())
}

#[test]
fn test_count_missing_file_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;

    minfo_cmd()
        .arg("count")
        .arg(dir.path().join("missing.mkv"))
        .assert()
        .code(2)
        .stderr(contains("Failed to count streams"));
    Ok(())
}

// --- get ---

#[test]
fn test_get_by_name() -> Result<(), Box<dyn Error>> {
    let (_dir, path) = sample();

    minfo_cmd()
        .arg("get")
        .arg(&path)
        .args(["--kind", "video", "--param", "Width"])
        .assert()
        .success()
        .stdout("1920\n");
    Ok(())
}

#[test]
fn test_get_case_insensitive_search() -> Result<(), Box<dyn Error>> {
    let (_dir, path) = sample();

    minfo_cmd()
        .arg("get")
        .arg(&path)
        .args(["-k", "audio", "-p", "channels", "--search", "name-text"])
        .assert()
        .success()
        .stdout("2\n");
    Ok(())
}

#[test]
fn test_get_by_index_name_facet() -> Result<(), Box<dyn Error>> {
    let (_dir, path) = sample();

    minfo_cmd()
        .arg("get")
        .arg(&path)
        .args(["--kind", "video", "--index", "2", "--info", "name"])
        .assert()
        .success()
        .stdout("Height\n");
    Ok(())
}

#[test]
fn test_get_lists_stream_parameters() -> Result<(), Box<dyn Error>> {
    let (_dir, path) = sample();

    minfo_cmd()
        .arg("get")
        .arg(&path)
        .args(["--kind", "audio"])
        .assert()
        .success()
        .stdout("Format   : AAC\nChannels : 2\n");
    Ok(())
}

#[test]
fn test_get_unknown_parameter_fails() -> Result<(), Box<dyn Error>> {
    let (_dir, path) = sample();

    minfo_cmd()
        .arg("get")
        .arg(&path)
        .args(["--kind", "video", "--param", "NoSuchThing"])
        .assert()
        .code(1)
        .stderr(contains("No Text for 'NoSuchThing'"));
    Ok(())
}

#[test]
fn test_get_missing_file_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;

    minfo_cmd()
        .arg("get")
        .arg(dir.path().join("missing.mkv"))
        .args(["--param", "Format"])
        .assert()
        .code(2)
        .stderr(contains("Could not read media file"));
    Ok(())
}

// --- native engine ---

#[test]
fn test_native_engine_with_bad_library() {
    Command::cargo_bin("minfo")
        .expect("Failed to find minfo binary")
        .env_remove("MINFO_LIBRARY")
        .args(["--library", "/surely/not/here/libmediainfo.so", "version"])
        .assert()
        .code(3)
        .stderr(contains("MediaInfo library is not available"));
}
