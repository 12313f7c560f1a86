use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use serde_json::json;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_to-dict"))
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("failed to write fixture");
    path
}

fn run_with_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = bin()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn to-dict");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait on to-dict")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "to-dict failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

const PERSON: &str = r#"{"name": "Ann", "age": 30, "_secret": "s", "tags": ["x", "y"]}"#;
const NESTED: &str = r#"{"child": {"value": 1, "extra": 2}, "other": 3}"#;

// ---------------------------------------------------------------------------
// Schema filtering
// ---------------------------------------------------------------------------

#[test]
fn greedy_with_negation_from_stdin() {
    let output = run_with_stdin(&["-s", "-age"], PERSON);
    assert_eq!(
        stdout_json(&output),
        json!({"name": "Ann", "tags": ["x", "y"]})
    );
}

#[test]
fn strict_nested_path_from_file() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "input.json", NESTED);
    let output = bin()
        .args(["--strict", "-s", "child.value", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(stdout_json(&output), json!({"child": {"value": 1}}));
}

#[test]
fn comma_separated_schema_with_wildcard() {
    let output = run_with_stdin(&["--strict", "--schema", "child.*,other"], NESTED);
    assert_eq!(
        stdout_json(&output),
        json!({"child": {"value": 1, "extra": 2}, "other": 3})
    );
}

#[test]
fn no_private_prefix_keeps_underscored_fields() {
    let output = run_with_stdin(&["--no-private-prefix", "-s", "-tags,-age"], PERSON);
    assert_eq!(
        stdout_json(&output),
        json!({"name": "Ann", "_secret": "s"})
    );
}

// ---------------------------------------------------------------------------
// Formats and options
// ---------------------------------------------------------------------------

#[test]
fn yaml_input_detected_by_extension() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "input.yaml", "name: Ann\nage: 30\n");
    let output = bin()
        .args(["-s", "-age", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(stdout_json(&output), json!({"name": "Ann"}));
}

#[test]
fn yaml_output() {
    let output = run_with_stdin(&["--output-format", "yaml", "-s", "-age,-tags"], PERSON);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim(), "name: Ann");
}

#[test]
fn config_file_with_flag_override() {
    let dir = TempDir::new().unwrap();
    let config = write_file(
        &dir,
        "options.yaml",
        "is_greedy: false\ndate_format: \"DD.MM.YYYY\"\n",
    );
    let doc = r#"{"born": "1990-04-12", "name": "Ann"}"#;

    let output = run_with_stdin(
        &[
            "--config",
            config.to_str().unwrap(),
            "--parse-dates",
            "-s",
            "born",
        ],
        doc,
    );
    assert_eq!(stdout_json(&output), json!({"born": "12.04.1990"}));

    let output = run_with_stdin(
        &[
            "--config",
            config.to_str().unwrap(),
            "--parse-dates",
            "--date-format",
            "YYYY/MM/DD",
            "-s",
            "born",
        ],
        doc,
    );
    assert_eq!(stdout_json(&output), json!({"born": "1990/04/12"}));
}

#[test]
fn datetimes_converted_to_user_timezone() {
    let doc = r#"{"at": "2024-01-15T23:30:00+05:00"}"#;
    let output = run_with_stdin(
        &["--parse-dates", "--to-user-tz", "--user-timezone", "+01:00"],
        doc,
    );
    assert_eq!(stdout_json(&output), json!({"at": "2024-01-15 19:30"}));

    let output = run_with_stdin(&["--parse-dates"], doc);
    assert_eq!(stdout_json(&output), json!({"at": "2024-01-15 23:30"}));
}

#[test]
fn dates_stay_strings_without_parse_dates() {
    let doc = r#"{"born": "1990-04-12"}"#;
    let output = run_with_stdin(&["--date-format", "DD.MM.YYYY"], doc);
    assert_eq!(stdout_json(&output), json!({"born": "1990-04-12"}));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn invalid_json_fails_with_message() {
    let output = run_with_stdin(&[], "{not json");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: Failed to parse stdin"), "{stderr}");
}

#[test]
fn invalid_timezone_fails() {
    let output = run_with_stdin(&["--user-timezone", "moon"], PERSON);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid user timezone: moon"), "{stderr}");
}

#[test]
fn missing_input_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");
    let output = bin().arg(missing.to_str().unwrap()).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read"), "{stderr}");
}
