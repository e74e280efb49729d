mod common;

use common::{simulated_series, to_csv};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_price-forecast"));
    cmd.env("RUST_LOG", "off");
    cmd
}

fn csv_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file
}

#[test]
fn test_csv_output() {
    let file = csv_file(&to_csv(&simulated_series(80, 12)));
    let output = cli()
        .args(["--input", file.path().to_str().unwrap()])
        .args(["--horizon", "5", "--format", "csv"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("date,predicted,lower_bound,upper_bound,error_margin_pct")
    );
    assert_eq!(lines.count(), 5);
}

#[test]
fn test_json_output() {
    let file = csv_file(&to_csv(&simulated_series(80, 13)));
    let output = cli()
        .args(["--input", file.path().to_str().unwrap()])
        .args(["--horizon", "3", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 3);
}

#[test]
fn test_invalid_horizon_fails_without_output() {
    let file = csv_file(&to_csv(&simulated_series(80, 14)));
    let output = cli()
        .args(["--input", file.path().to_str().unwrap()])
        .args(["--horizon", "-5"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Invalid horizon -5"));
}

#[test]
fn test_fit_error_fails_without_output() {
    let file = csv_file(b"data,preco\n01/01/2020,\"50,00\"\n02/01/2020,\"51,50\"\n03/01/2020,\"49,75\"\n");
    let output = cli()
        .args(["--input", file.path().to_str().unwrap()])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8(output.stderr).unwrap().contains("Fit error"));
}

#[test]
fn test_missing_input_file() {
    let output = cli()
        .args(["--input", "nonexistent_file.csv"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8(output.stderr).unwrap().contains("IO error"));
}
