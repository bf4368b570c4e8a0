#![cfg(feature = "cli")]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "tedrx-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn tedrx(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tedrx"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("tedrx should run")
}

fn simulate(path: &Path, extra: &[&str]) {
    let path = path.to_str().expect("utf-8 path");
    let mut args = vec!["simulate", path];
    args.extend_from_slice(extra);
    let output = tedrx(&args);
    assert!(output.status.success(), "simulate failed: {output:?}");
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect()
}

#[test]
fn decode_reads_simulated_capture() {
    let dir = unique_temp_dir("decode");
    let capture = dir.join("capture.bin");
    simulate(&capture, &["--count", "3", "--kw", "1.5", "--step", "0.5"]);

    let output = tedrx(&["--format", "json", "decode", capture.to_str().unwrap()]);
    assert!(output.status.success(), "decode failed: {output:?}");

    let packets = json_lines(&output);
    assert_eq!(packets.len(), 3);
    let kw: Vec<f64> = packets
        .iter()
        .map(|p| p["KWNow"].as_f64().expect("KWNow should be a number"))
        .collect();
    for (got, want) in kw.iter().zip([1.5, 2.0, 2.5]) {
        assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
    }
    assert!(packets[0]["timestamp"].as_f64().unwrap() > 0.0);
    assert!((packets[0]["VrmsNowDsp"].as_f64().unwrap() - 120.0).abs() < 1e-9);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_ignores_noise_and_honours_count() {
    let dir = unique_temp_dir("noise");
    let capture = dir.join("capture.bin");
    simulate(&capture, &["--count", "5", "--noise"]);

    let output = tedrx(&[
        "--format",
        "json",
        "decode",
        capture.to_str().unwrap(),
        "--count",
        "2",
    ]);
    assert!(output.status.success(), "decode failed: {output:?}");
    assert_eq!(json_lines(&output).len(), 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_rejects_unknown_escape() {
    let dir = unique_temp_dir("escape");
    let capture = dir.join("bad.bin");
    std::fs::write(&capture, [0x10, 0x04, 0x10, 0x99]).unwrap();

    let output = tedrx(&["--format", "json", "decode", capture.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown escape byte"));

    let output = tedrx(&[
        "--format",
        "json",
        "decode",
        capture.to_str().unwrap(),
        "--skip-bad-frames",
    ]);
    assert!(output.status.success());
    assert!(json_lines(&output).is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn skip_bad_frames_keeps_packets_around_bad_escape() {
    let dir = unique_temp_dir("resync");
    let before = dir.join("before.bin");
    let after = dir.join("after.bin");
    simulate(&before, &["--count", "2", "--kw", "1.0", "--step", "1.0"]);
    simulate(&after, &["--count", "2", "--kw", "3.0", "--step", "1.0"]);

    let mut bytes = std::fs::read(&before).unwrap();
    bytes.extend([0x10, 0x04, 0x01, 0x10, 0x99]);
    bytes.extend(std::fs::read(&after).unwrap());
    let capture = dir.join("mixed.bin");
    std::fs::write(&capture, bytes).unwrap();

    let output = tedrx(&[
        "--format",
        "json",
        "decode",
        capture.to_str().unwrap(),
        "--skip-bad-frames",
    ]);
    assert!(output.status.success(), "decode failed: {output:?}");
    let kw: Vec<f64> = json_lines(&output)
        .iter()
        .map(|p| p["KWNow"].as_f64().unwrap())
        .collect();
    assert_eq!(kw.len(), 4);
    for (got, want) in kw.iter().zip([1.0, 2.0, 3.0, 4.0]) {
        assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
    }

    let output = tedrx(&["--format", "json", "decode", capture.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));
    assert_eq!(json_lines(&output).len(), 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_rejects_short_frame() {
    let dir = unique_temp_dir("short");
    let capture = dir.join("short.bin");
    let mut bytes = vec![0x10, 0x04];
    bytes.extend(std::iter::repeat_n(0u8, 275));
    bytes.extend([0x10, 0x03]);
    std::fs::write(&capture, bytes).unwrap();

    let output = tedrx(&["decode", capture.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported payload length"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_missing_file_is_not_found() {
    let output = tedrx(&["decode", "/nonexistent/tedrx/capture.bin"]);
    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn fields_lists_protocol_table() {
    let output = tedrx(&["--format", "json", "fields"]);
    assert!(output.status.success());

    let table: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = table.as_array().expect("fields should be an array");
    assert_eq!(entries.len(), 19);
    assert_eq!(entries[1]["name"], "KWNow");
    assert_eq!(entries[1]["offset"], 247);
    assert_eq!(entries[18]["name"], "DlrMtd");
    assert_eq!(entries[18]["width"], 4);
}

#[test]
fn version_prints_package_version() {
    let output = tedrx(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("tedrx {}", env!("CARGO_PKG_VERSION"))
    );
}
