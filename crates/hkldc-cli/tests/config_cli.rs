use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use hkldc_core::config::{ConfigurationModel, ExportFormat, from_json, from_yaml, to_json};
use hkldc_core::oracle::GeometryOracle;
use hkldc_core::oracle::sim::SimulatedDiffractometer;
use serde_json::Value;
use tempfile::TempDir;

fn captured_json() -> String {
    let mut oracle = SimulatedDiffractometer::new();
    let r1 = oracle
        .add_reflection("main", &[1.0, 0.0, 0.0], &[30.0, 0.0, 0.0, 60.0])
        .expect("first reflection should add");
    let r2 = oracle
        .add_reflection("main", &[0.0, 1.0, 0.0], &[30.0, 90.0, 0.0, 60.0])
        .expect("second reflection should add");
    oracle.compute_ub("main", r1, r2).expect("UB should compute");

    let model = ConfigurationModel::for_oracle(&oracle);
    let document = model.capture(&oracle).expect("capture should succeed");
    to_json(&document).expect("document should render")
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hkldc"))
        .args(args)
        .output()
        .expect("binary should run")
}

fn write_file(path: &Path, content: &str) {
    fs::write(path, content).expect("test file should be writable");
}

#[test]
fn validate_accepts_a_captured_document() {
    let temp = TempDir::new().expect("tempdir should be created");
    let path = temp.path().join("config.json");
    write_file(&path, &captured_json());

    let output = run_cli(&["validate", path.to_str().expect("utf-8 path")]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("OK: SIM4C"));
    assert!(stdout.contains("1 sample(s)"));
}

#[test]
fn validate_rejects_an_unknown_field() {
    let temp = TempDir::new().expect("tempdir should be created");
    let mut value: Value =
        serde_json::from_str(&captured_json()).expect("captured JSON should parse");
    value["surprise"] = Value::from(1);
    let path = temp.path().join("config.json");
    write_file(&path, &value.to_string());

    let output = run_cli(&["validate", path.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR:"));
    assert!(stderr.contains("surprise"));
}

#[test]
fn validate_collects_semantic_violations() {
    let temp = TempDir::new().expect("tempdir should be created");
    let mut value: Value =
        serde_json::from_str(&captured_json()).expect("captured JSON should parse");
    value["samples"]["main"]["lattice"]["a"] = Value::from(-1.0);
    value["constraints"]["omega"]["low_limit"] = Value::from(-400.0);
    let path = temp.path().join("config.json");
    write_file(&path, &value.to_string());

    let output = run_cli(&["validate", path.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    // both violations arrive in one diagnostic
    assert!(stderr.contains("lattice"));
    assert!(stderr.contains("omega"));
}

#[test]
fn convert_renders_yaml_to_stdout() {
    let temp = TempDir::new().expect("tempdir should be created");
    let json = captured_json();
    let path = temp.path().join("config.json");
    write_file(&path, &json);

    let output = run_cli(&[
        "convert",
        path.to_str().expect("utf-8 path"),
        "--format",
        "yaml",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("geometry: SIM4C"));
    let converted = from_yaml(&stdout).expect("stdout should parse as YAML");
    let original = from_json(&json).expect("input should parse as JSON");
    assert_eq!(converted, original);
}

#[test]
fn convert_writes_the_requested_output_file() {
    let temp = TempDir::new().expect("tempdir should be created");
    let source = SimulatedDiffractometer::new();
    let model = ConfigurationModel::for_oracle(&source);
    let yaml = model
        .export(&source, ExportFormat::Yaml)
        .expect("export should succeed");
    let input = temp.path().join("config.yml");
    write_file(&input, &yaml);

    let output_path = temp.path().join("out/config.json");
    let output = run_cli(&[
        "convert",
        input.to_str().expect("utf-8 path"),
        "--format",
        "json",
        "--output",
        output_path.to_str().expect("utf-8 path"),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written = fs::read_to_string(&output_path).expect("output file should exist");
    let converted = from_json(&written).expect("output should parse as JSON");
    let original = from_yaml(&yaml).expect("input should parse as YAML");
    assert_eq!(converted, original);
}

#[test]
fn convert_rejects_an_unknown_format_name() {
    let temp = TempDir::new().expect("tempdir should be created");
    let path = temp.path().join("config.json");
    write_file(&path, &captured_json());

    let output = run_cli(&[
        "convert",
        path.to_str().expect("utf-8 path"),
        "--format",
        "toml",
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("toml"));
}

#[test]
fn summary_lists_constraints_and_samples() {
    let temp = TempDir::new().expect("tempdir should be created");
    let path = temp.path().join("config.json");
    write_file(&path, &captured_json());

    let output = run_cli(&["summary", path.to_str().expect("utf-8 path")]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Geometry: SIM4C"));
    assert!(stdout.contains("omega"));
    assert!(stdout.contains("main:"));
    assert!(stdout.contains("2 reflection(s), 2 used for orientation"));
}

#[test]
fn missing_input_file_maps_to_the_io_exit_code() {
    let output = run_cli(&["validate", "/nonexistent/config.json"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read"));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let output = run_cli(&["frobnicate"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: [InputValidation]"));
}
