//! Binary-surface tests: argument handling and the failure paths that need
//! no provider account.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn vpndrop() -> Command {
    Command::cargo_bin("vpndrop").expect("vpndrop binary should exist")
}

#[test]
fn test_no_args_shows_help_and_fails() {
    vpndrop()
        .assert()
        .failure()
        .stderr(predicate::str::contains("deploy").and(predicate::str::contains("destroy")));
}

#[test]
fn test_version_flag() {
    vpndrop()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vpndrop"));
}

#[test]
fn test_deploy_without_token_fails_with_hint() {
    // No env token and no TTY, so the prompt path is unavailable.
    let dir = TempDir::new().expect("tempdir");
    vpndrop()
        .arg("deploy")
        .current_dir(dir.path())
        .env_remove("DIGITALOCEAN_ACCESS_TOKEN")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DIGITALOCEAN_ACCESS_TOKEN"));
}

#[test]
fn test_destroy_without_record_refuses() {
    let dir = TempDir::new().expect("tempdir");
    vpndrop()
        .arg("destroy")
        .current_dir(dir.path())
        .env_remove("DIGITALOCEAN_ACCESS_TOKEN")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active deployment"));
}

#[test]
fn test_destroy_with_yes_still_refuses_without_record() {
    // --yes skips confirmation, not the record check.
    let dir = TempDir::new().expect("tempdir");
    vpndrop()
        .args(["destroy", "--yes"])
        .current_dir(dir.path())
        .env_remove("DIGITALOCEAN_ACCESS_TOKEN")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active deployment"));
}

#[test]
fn test_status_without_record_refuses() {
    let dir = TempDir::new().expect("tempdir");
    vpndrop()
        .arg("status")
        .current_dir(dir.path())
        .env_remove("DIGITALOCEAN_ACCESS_TOKEN")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active deployment"));
}

#[test]
fn test_deploy_rejects_unknown_flag() {
    vpndrop()
        .args(["deploy", "--flavor", "large"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--flavor"));
}

#[test]
fn test_corrupt_record_is_reported_not_ignored() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("deployment.json"), b"{broken").expect("write record");
    vpndrop()
        .args(["destroy", "--yes"])
        .current_dir(dir.path())
        .env_remove("DIGITALOCEAN_ACCESS_TOKEN")
        .assert()
        .failure()
        .stderr(predicate::str::contains("deployment.json"));
}
