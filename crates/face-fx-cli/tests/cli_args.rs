//! CLI argument validation tests.
//!
//! Tests command-line argument parsing, validation, and error handling.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use face_fx_core::Rect;
use face_fx_test_support::{FaceFeatureBuilder, SyntheticFrameBuilder};
use predicates::prelude::*;

/// Writes a short session (frames directory plus recording) into `root`.
fn write_session(root: &Path, count: u64) -> (PathBuf, PathBuf) {
    let frames = root.join("frames");
    fs::create_dir(&frames).unwrap();
    for frame in SyntheticFrameBuilder::sequence(count, 160, 120) {
        frame
            .image
            .save(frames.join(format!("f_{:03}.png", frame.sequence)))
            .unwrap();
    }

    let face = FaceFeatureBuilder::new(Rect::new(40.0, 20.0, 60.0, 60.0)).build();
    let lines: Vec<String> = (0..count)
        .map(|i| serde_json::json!({ "frame": i, "faces": [face] }).to_string())
        .collect();
    let features = root.join("session.jsonl");
    fs::write(&features, lines.join("\n")).unwrap();
    (frames, features)
}

// === Missing/Invalid Path Tests ===

#[test]
fn test_missing_frames_shows_error() {
    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("No frames directory specified"));
}

#[test]
fn test_missing_features_shows_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (frames, _) = write_session(temp_dir.path(), 1);

    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg(&frames);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("--features"));
}

#[test]
fn test_nonexistent_frames_dir() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (_, features) = write_session(temp_dir.path(), 1);

    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg("/nonexistent/frames").arg("--features").arg(&features);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to read frame directory"));
}

#[test]
fn test_empty_frames_dir() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (_, features) = write_session(temp_dir.path(), 1);
    let empty = temp_dir.path().join("empty");
    fs::create_dir(&empty).unwrap();

    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg(&empty).arg("--features").arg(&features);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("No frame images found"));
}

#[test]
fn test_malformed_recording() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (frames, features) = write_session(temp_dir.path(), 1);
    fs::write(&features, "{\"frame\": 0}\nnot json").unwrap();

    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg(&frames).arg("--features").arg(&features);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("line 2"));
}

// === Format Validation Tests ===

#[test]
fn test_invalid_format_rejected() {
    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg("--format").arg("xml").arg("frames");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_valid_formats_accepted() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (frames, features) = write_session(temp_dir.path(), 2);

    for format in ["json", "jsonl"] {
        let mut cmd = Command::cargo_bin("face-fx").unwrap();
        cmd.arg(&frames)
            .arg("--features")
            .arg(&features)
            .arg("--format")
            .arg(format);
        cmd.assert().success();
    }
}

// === Tuning Validation Tests ===

#[test]
fn test_negative_fps_rejected() {
    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg("--fps=-5").arg("frames");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not a non-negative frame rate"));
}

#[test]
fn test_non_numeric_pose_threshold_rejected() {
    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg("--pose-threshold").arg("wide").arg("frames");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not a valid number"));
}

#[test]
fn test_inverted_blink_range_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (frames, features) = write_session(temp_dir.path(), 1);

    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg(&frames)
        .arg("--features")
        .arg(&features)
        .arg("--min-closed")
        .arg("5")
        .arg("--max-closed")
        .arg("2");
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid pipeline configuration"));
}

#[test]
fn test_unknown_algorithm_rejected() {
    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg("--algorithm").arg("peak-detect").arg("frames");
    cmd.assert().failure();
}

// === Verbosity Level Tests ===

#[test]
fn test_verbosity_levels() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (frames, features) = write_session(temp_dir.path(), 1);

    for flag in ["-v", "-vv", "-vvv"] {
        let mut cmd = Command::cargo_bin("face-fx").unwrap();
        cmd.arg(flag).arg(&frames).arg("--features").arg(&features);
        cmd.assert().success();
    }
}

#[test]
fn test_info_logs_replay_summary() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (frames, features) = write_session(temp_dir.path(), 3);

    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg("-v").arg(&frames).arg("--features").arg(&features);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Replay finished"));
}

#[test]
fn test_quiet_suppresses_progress() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (frames, features) = write_session(temp_dir.path(), 2);

    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg("--quiet")
        .arg("--progress")
        .arg(&frames)
        .arg("--features")
        .arg(&features);
    cmd.assert().success().stderr(predicate::str::is_empty());
}

// === Help and Version ===

#[test]
fn test_help_flag() {
    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--features"))
        .stdout(predicate::str::contains("--min-closed"))
        .stdout(predicate::str::contains("--format"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("face-fx"));
}

// === Run Subcommand ===

#[test]
fn test_run_subcommand() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (frames, features) = write_session(temp_dir.path(), 2);

    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg("run").arg(&frames).arg("--features").arg(&features);
    cmd.assert().success();
}

#[test]
fn test_run_subcommand_with_options() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (frames, features) = write_session(temp_dir.path(), 2);

    let mut cmd = Command::cargo_bin("face-fx").unwrap();
    cmd.arg("run")
        .arg("--algorithm")
        .arg("falling-edge")
        .arg("--pose-threshold")
        .arg("0.3")
        .arg(&frames)
        .arg("--features")
        .arg(&features);
    cmd.assert().success();
}
