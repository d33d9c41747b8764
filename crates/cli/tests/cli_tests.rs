//! CLI integration tests

use std::process::Command;

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "clusterpulse-cli", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("ClusterPulse"),
        "Should show app name"
    );
    assert!(stdout.contains("get"), "Should show get command");
    assert!(stdout.contains("overview"), "Should show overview command");
    assert!(stdout.contains("run"), "Should show run command");
    assert!(stdout.contains("running"), "Should show running command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = Command::new("cargo")
        .args(["run", "-p", "clusterpulse-cli", "--", "--version"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("cpulse"), "Should show binary name");
}

/// Test get pods subcommand help
#[test]
fn test_get_pods_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "clusterpulse-cli", "--", "get", "pods", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Get pods help should succeed");
    assert!(
        stdout.contains("--namespace"),
        "Should show namespace option"
    );
}

/// Test run command help
#[test]
fn test_run_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "clusterpulse-cli", "--", "run", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Run help should succeed");
    assert!(
        stdout.contains("--script-type"),
        "Should show script-type option"
    );
    assert!(stdout.contains("--timeout"), "Should show timeout option");
    assert!(stdout.contains("--env"), "Should show env option");
}

/// Test format option
#[test]
fn test_format_option() {
    let output = Command::new("cargo")
        .args(["run", "-p", "clusterpulse-cli", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("table"), "Should show table format");
    assert!(stdout.contains("json"), "Should show json format");
}

/// Test api-url option
#[test]
fn test_api_url_option() {
    let output = Command::new("cargo")
        .args(["run", "-p", "clusterpulse-cli", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("PULSE_API_URL"), "Should show env var");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = Command::new("cargo")
        .args(["run", "-p", "clusterpulse-cli", "--", "invalid-command"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

/// Test missing required argument error handling
#[test]
fn test_missing_argument() {
    let output = Command::new("cargo")
        .args(["run", "-p", "clusterpulse-cli", "--", "run"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Missing argument should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required") || stderr.contains("error"),
        "Should show error about missing argument"
    );
}
