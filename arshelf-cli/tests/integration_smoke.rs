//! Smoke tests for command wiring

use assert_cmd::Command;
use predicates::prelude::*;

fn arshelf() -> Command {
    let mut cmd = Command::cargo_bin("arshelf").unwrap();
    cmd.env_remove("DATABASE_URL").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_top_level_help_lists_commands() {
    arshelf()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("lookup"));
}

#[test]
fn test_serve_help() {
    arshelf()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--memory"))
        .stdout(predicate::str::contains("--public-dir"));
}

#[test]
fn test_lookup_help() {
    arshelf()
        .args(["lookup", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Barcode value"));
}

#[test]
fn test_lookup_rejects_bad_app_id() {
    arshelf()
        .args(["lookup", "not-a-uuid", "123"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_migrate_requires_database_url() {
    arshelf()
        .current_dir(tempfile::tempdir().unwrap().path())
        .env("HOME", "/nonexistent")
        .arg("migrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--database-url"));
}

#[test]
fn test_serve_without_database_fails_fast() {
    arshelf()
        .current_dir(tempfile::tempdir().unwrap().path())
        .env("HOME", "/nonexistent")
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL not set"));
}

#[test]
fn test_completions_bash() {
    arshelf()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("arshelf"));
}
