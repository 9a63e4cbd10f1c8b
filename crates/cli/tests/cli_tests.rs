//! CLI integration tests

use std::io::Write;
use std::process::{Command, Output};

fn reest(args: &[&str]) -> Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "reest-cli", "--"])
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = reest(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Real Estate Estimator"),
        "Should show app name"
    );
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("train"), "Should show train command");
    assert!(stdout.contains("categories"), "Should show categories command");
    assert!(stdout.contains("locations"), "Should show locations command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = reest(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("reest"), "Should show binary name");
}

/// Test predict subcommand help
#[test]
fn test_predict_help() {
    let output = reest(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    assert!(stdout.contains("--category"), "Should show category option");
    assert!(stdout.contains("--land-area"), "Should show land area option");
    assert!(stdout.contains("--floors"), "Should show floors option");
    assert!(stdout.contains("--demand"), "Should show demand option");
}

/// Test categories listing as JSON
#[test]
fn test_categories_json() {
    let output = reest(&["categories", "--format", "json"]);
    assert!(output.status.success(), "Categories should succeed");

    let rows: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be JSON");
    let rows = rows.as_array().expect("Output should be an array");
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[0]["category"], "shopping_mall");
}

/// Test locations listing
#[test]
fn test_locations_table() {
    let output = reest(&["locations"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Locations should succeed");
    assert!(stdout.contains("حي النرجس"));
    assert!(stdout.contains("5,700 ريال"));
}

/// Test that an invalid category is rejected
#[test]
fn test_invalid_category() {
    let output = reest(&[
        "predict",
        "--category",
        "warehouse",
        "--location",
        "جدة",
        "--land-area",
        "1000",
        "--floors",
        "3",
    ]);
    assert!(!output.status.success(), "Invalid category should fail");
}

/// Test that an unknown location fails and lists the known ones
#[test]
fn test_unknown_location() {
    let output = reest(&[
        "predict",
        "--category",
        "residential",
        "--location",
        "nowhere",
        "--land-area",
        "1000",
        "--floors",
        "3",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Unknown location should fail");
    assert!(stderr.contains("nowhere"));
    assert!(stderr.contains("جدة"));
}

/// Test a seeded prediction with a configured extra location
#[test]
fn test_predict_json_with_config() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create config file");
    writeln!(
        file,
        "[training]\nsample_count = 300\n\n[locations]\n\"حي العليا\" = 9000.0\n"
    )
    .expect("Failed to write config file");
    let config_path = file.path().to_string_lossy().to_string();

    let output = reest(&[
        "--config",
        &config_path,
        "--seed",
        "42",
        "--format",
        "json",
        "predict",
        "--category",
        "shopping_mall",
        "--location",
        "حي العليا",
        "--land-area",
        "2000",
        "--floors",
        "3",
        "--epochs",
        "3",
    ]);
    assert!(
        output.status.success(),
        "Predict should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be JSON");
    assert_eq!(report["project"]["location"], "حي العليا");
    assert_eq!(report["project"]["category"], "shopping_mall");
    assert_eq!(report["mall_details"]["shop_count"], 42);
    assert_eq!(report["performance"]["annual_growth"], "8-12%");
}

/// Test training a single category
#[test]
fn test_train_single_category() {
    let output = reest(&[
        "--seed",
        "1",
        "train",
        "--category",
        "commercial",
        "--epochs",
        "2",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Train should succeed");
    assert!(stdout.contains("commercial"));
    assert!(stdout.contains("Trained 1 categories"));
}
