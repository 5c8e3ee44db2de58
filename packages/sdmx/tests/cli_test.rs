//! Tests of the command-line binary that need no network access.

use assert_cmd::Command;
use predicates::prelude::*;

fn sdmx() -> Command {
    Command::cargo_bin("sdmx-rest").unwrap()
}

#[test]
fn test_help_lists_commands() {
    sdmx()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("code-lists"))
        .stdout(predicate::str::contains("data"))
        .stdout(predicate::str::contains("--base-url"));
}

#[test]
fn test_invalid_base_url_fails() {
    sdmx()
        .args(["--base-url", "not a url", "dataflows"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_invalid_agency_fails() {
    sdmx()
        .args(["--agency", "E C B", "code-lists", "EXR"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_missing_flow_is_usage_error() {
    sdmx().arg("code-lists").assert().failure().code(2);
}

#[test]
fn test_injected_query_parameter_fails_before_fetching() {
    sdmx()
        .args(["--base-url", "http://127.0.0.1:9", "data", "EXR&FREQ=D"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid dataflow: 'EXR&FREQ=D'"));
}
