//! CLI integration tests

use std::process::{Command, Output};
use tempfile::TempDir;

/// Run `qc` with an isolated home directory so no user config leaks in
fn qc(args: &[&str]) -> Output {
    let home = TempDir::new().expect("Failed to create temp home");
    Command::new(env!("CARGO_BIN_EXE_qc"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("QC_API_URL")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = qc(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Polymer Quality Classifier"),
        "Should show app name"
    );
    for command in ["models", "predict", "sample", "metrics", "watch"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
    assert!(stdout.contains("--api-url"), "Should show api-url option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = qc(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("qc"), "Should show binary name");
}

/// Test predict subcommand help
#[test]
fn test_predict_help() {
    let output = qc(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    for flag in ["--drc", "--moisture", "--impurities", "--color", "--model"] {
        assert!(stdout.contains(flag), "Should show {} option", flag);
    }
}

/// Test watch subcommand help
#[test]
fn test_watch_help() {
    let output = qc(&["watch", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Watch help should succeed");
    assert!(stdout.contains("--dataset"), "Should show dataset option");
    assert!(stdout.contains("--rows"), "Should show rows option");
    assert!(stdout.contains("--interval-ms"), "Should show interval option");
}

/// Predict requires all four features
#[test]
fn test_predict_missing_feature() {
    let output = qc(&["predict", "--drc", "65.5", "--moisture", "0.5", "--impurities", "0.3"]);

    assert!(!output.status.success(), "Missing --color should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--color"), "Should name the missing option");
}

/// Out-of-range features are rejected before any request is made
#[test]
fn test_predict_out_of_range_rejected_locally() {
    let output = qc(&[
        "--api-url",
        "http://127.0.0.1:9",
        "predict",
        "--drc",
        "150",
        "--moisture",
        "0.5",
        "--impurities",
        "0.3",
        "--color",
        "9",
    ]);

    assert!(!output.status.success(), "Out-of-range input should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("drcPercentage is out-of-range"),
        "Should explain the rejected feature: {}",
        stderr
    );
}

/// Watch needs a dataset from the flag or the config file
#[test]
fn test_watch_without_dataset() {
    let output = qc(&["--api-url", "http://127.0.0.1:9", "watch"]);

    assert!(!output.status.success(), "Watch without dataset should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--dataset"), "Should mention --dataset");
}

/// Unreachable server is reported as an error, not a panic
#[test]
fn test_unreachable_server() {
    let output = qc(&["--api-url", "http://127.0.0.1:9", "models"]);

    assert!(!output.status.success(), "Unreachable server should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to send request"));
}
