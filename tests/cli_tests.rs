//! CLI integration tests.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;

fn derivgate() -> Command {
    let mut cmd = cargo_bin_cmd!("derivgate");
    cmd.env_remove("DERIV_API_TOKEN").env("HOME", std::env::temp_dir());
    cmd
}

#[test]
fn test_help() {
    derivgate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("derivgate"))
        .stdout(predicate::str::contains("authorize"))
        .stdout(predicate::str::contains("ticks"))
        .stdout(predicate::str::contains("buy"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version() {
    derivgate()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("derivgate"));
}

#[test]
fn config_validate_fails_on_bad_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[deriv]\nws_url = \"http://example.com\"\n").unwrap();

    derivgate()
        .args(["--color", "never", "config", "validate", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("deriv.ws_url"));
}

#[test]
fn config_init_then_validate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    derivgate()
        .args(["--color", "never", "config", "init"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(path.exists());

    derivgate()
        .args(["--color", "never", "config", "validate", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Config file is valid"));

    // A second init refuses to overwrite.
    derivgate()
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn config_show_json_reports_missing_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    derivgate()
        .args(["--json", "config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"api_token_loaded\":false"))
        .stdout(predicate::str::contains("\"exists\":false"));
}

#[test]
fn account_command_without_token_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    derivgate()
        .args(["--color", "never", "balance", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("DERIV_API_TOKEN"));
}

#[test]
fn buy_rejects_non_decimal_amount() {
    derivgate()
        .args([
            "buy",
            "--symbol",
            "R_100",
            "--contract-type",
            "CALL",
            "--amount",
            "ten",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--amount"));
}
