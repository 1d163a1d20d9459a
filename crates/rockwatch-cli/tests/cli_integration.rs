//! CLI Integration Tests
//!
//! These tests run the compiled `rockwatch` binary and check its output
//! formats and command behaviors.
//!
//! ```
//! cargo test --package rockwatch-cli --test cli_integration
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// Run rockwatch with an isolated, empty config file and return output.
fn run_rockwatch(config_dir: &TempDir, args: &[&str]) -> Output {
    run_rockwatch_with_stdin(config_dir, args, None)
}

fn run_rockwatch_with_stdin(config_dir: &TempDir, args: &[&str], stdin: Option<&str>) -> Output {
    let config = empty_config(config_dir);
    let mut child = Command::new(env!("CARGO_BIN_EXE_rockwatch"))
        .arg("--config")
        .arg(&config)
        .arg("--no-color")
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run rockwatch binary");

    {
        let mut pipe = child.stdin.take().expect("stdin is piped");
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes()).expect("write stdin");
        }
    }
    child.wait_with_output().expect("Failed to wait for rockwatch")
}

fn empty_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("config.toml");
    if !path.exists() {
        std::fs::write(&path, "").expect("write config");
    }
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_feed(dir: &Path) -> PathBuf {
    let path = dir.join("feed.jsonl");
    std::fs::write(
        &path,
        concat!(
            "{\"type\": \"connect\"}\n",
            "{\"co2\": 450, \"temperature\": 20, \"humidity\": 50, \"timestamp\": \"2024-05-01T12:00:00Z\"}\n",
            "{\"co2\": 850, \"temperature\": 36, \"humidity\": 88, \"timestamp\": \"2024-05-01T12:00:02Z\"}\n",
            "garbage\n",
            "{\"co2\": 1050, \"temperature\": 42, \"humidity\": 96, \"timestamp\": \"2024-05-01T12:00:04Z\"}\n",
        ),
    )
    .expect("write feed");
    path
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    let output = run_rockwatch(&dir, &["--help"]);

    assert!(output.status.success(), "Help should succeed");

    let stdout = stdout(&output);
    assert!(stdout.contains("rockwatch"), "Help should mention rockwatch");
    assert!(stdout.contains("assess"), "Help should list assess command");
    assert!(stdout.contains("replay"), "Help should list replay command");
    assert!(stdout.contains("simulate"), "Help should list simulate command");
    assert!(stdout.contains("config"), "Help should list config command");
}

#[test]
fn test_version_command() {
    let dir = TempDir::new().unwrap();
    let output = run_rockwatch(&dir, &["--version"]);

    assert!(output.status.success(), "Version should succeed");
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    let output = run_rockwatch(&dir, &["scan"]);
    assert!(!output.status.success());
}

// =============================================================================
// Assess
// =============================================================================

#[test]
fn test_assess_text() {
    let dir = TempDir::new().unwrap();
    let output = run_rockwatch(
        &dir,
        &["assess", "--co2", "1050", "--temperature", "42", "--humidity", "96"],
    );

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("[CRITICAL] score 10/10"), "{stdout}");
    assert!(stdout.contains("Immediate action required"));
    assert!(stdout.contains("High CO₂ levels detected"));
}

#[test]
fn test_assess_json() {
    let dir = TempDir::new().unwrap();
    let output = run_rockwatch(
        &dir,
        &[
            "assess",
            "--co2",
            "650",
            "--temperature",
            "20",
            "--humidity",
            "50",
            "--format",
            "json",
        ],
    );

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["score"], 2);
    assert_eq!(value["level"], "MEDIUM");
    assert_eq!(value["factors"][0], "Moderate CO₂ increase");
    assert_eq!(value["timeframe"], "Monitor closely - 12-24 hours");
}

#[test]
fn test_assess_negative_temperature_fahrenheit() {
    let dir = TempDir::new().unwrap();
    let output = run_rockwatch(
        &dir,
        &[
            "assess",
            "--co2",
            "400",
            "--temperature",
            "-5",
            "--humidity",
            "50",
            "--fahrenheit",
            "--format",
            "json",
        ],
    );

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["score"], 3);
    assert_eq!(value["temperature_unit"], "F");
    assert_eq!(value["temperature"], 23.0);
}

#[test]
fn test_assess_uses_configured_thresholds() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[classifier]\nco2_moderate = 700.0\n",
    )
    .unwrap();
    let output = run_rockwatch(
        &dir,
        &[
            "assess",
            "--co2",
            "650",
            "--temperature",
            "20",
            "--humidity",
            "50",
            "-f",
            "json",
        ],
    );

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["score"], 0);
    assert_eq!(value["level"], "LOW");
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[history]\ncapacity = 0\n").unwrap();
    let output = run_rockwatch(
        &dir,
        &["assess", "--co2", "400", "--temperature", "20", "--humidity", "50"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("history.capacity"), "{stderr}");
}

// =============================================================================
// Replay
// =============================================================================

#[test]
fn test_replay_file_csv() {
    let dir = TempDir::new().unwrap();
    let feed = write_feed(dir.path());
    let output = run_rockwatch(
        &dir,
        &["replay", feed.to_str().unwrap(), "--format", "csv"],
    );

    assert!(output.status.success());
    let stdout = stdout(&output);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4, "{stdout}");
    assert!(lines[0].starts_with("timestamp,co2_ppm"));
    assert!(lines[1].starts_with("2024-05-01T12:00:00Z,450.0,20.0,50.0,0,LOW,"));
    assert!(lines[2].contains(",7,CRITICAL,"), "{stdout}");
    assert!(lines[3].contains(",10,CRITICAL,"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Skipping malformed line"), "{stderr}");
}

#[test]
fn test_replay_stdin_json_summary() {
    let dir = TempDir::new().unwrap();
    let input = "{\"co2\": 650, \"temperature\": 20, \"humidity\": 50}\n{\"co2\": 700}\n";
    let output = run_rockwatch_with_stdin(&dir, &["replay", "-", "-f", "json"], Some(input));

    assert!(output.status.success());
    let stdout = stdout(&output);
    let values: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0]["level"], "MEDIUM");
    // Missing temperature and humidity default to zero
    assert_eq!(values[1]["score"], 5);
    assert_eq!(values[1]["level"], "HIGH");
    assert_eq!(values[1]["warnings"][0]["kind"], "field_missing");
    assert_eq!(values[1]["warnings"][0]["field"], "temperature");

    let summary = &values[2];
    assert_eq!(summary["ingested"], 2);
    assert_eq!(summary["state"], "connecting");
    assert_eq!(summary["distribution"]["medium"], 1);
    assert_eq!(summary["distribution"]["high"], 1);
}

#[test]
fn test_replay_output_file() {
    let dir = TempDir::new().unwrap();
    let feed = write_feed(dir.path());
    let out = dir.path().join("risk.txt");
    let output = run_rockwatch(
        &dir,
        &[
            "replay",
            feed.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ],
    );

    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("-- Connected --"));
    assert!(written.contains("Session Summary"));
    assert!(written.contains("3 ingested, 3 in history, 3 predictions"));
}

#[test]
fn test_replay_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let output = run_rockwatch(&dir, &["replay", "does-not-exist.jsonl"]);
    assert!(!output.status.success());
}

// =============================================================================
// Simulate
// =============================================================================

#[test]
fn test_simulate_count() {
    let dir = TempDir::new().unwrap();
    let output = run_rockwatch(
        &dir,
        &[
            "simulate",
            "--scenario",
            "stable",
            "--count",
            "3",
            "--interval-ms",
            "10",
            "--seed",
            "5",
            "--format",
            "csv",
        ],
    );

    assert!(output.status.success());
    let stdout = stdout(&output);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4, "{stdout}");
    assert!(lines[1..].iter().all(|line| line.contains(",LOW,")));
}

// =============================================================================
// Config
// =============================================================================

#[test]
fn test_config_path_and_init() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("nested").join("rockwatch.toml");
    let target_str = target.to_str().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_rockwatch"))
        .args(["--config", target_str, "config", "path"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), target_str);

    let output = Command::new(env!("CARGO_BIN_EXE_rockwatch"))
        .args(["--no-color", "--config", target_str, "config", "init"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(target.exists());

    let output = Command::new(env!("CARGO_BIN_EXE_rockwatch"))
        .args(["--config", target_str, "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("[simulate]"));
}
