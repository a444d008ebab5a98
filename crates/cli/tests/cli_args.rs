//! Argument-surface tests for the `insight` binary.
//!
//! These only exercise clap parsing; nothing here talks to a backend.

use assert_cmd::Command;
use predicates::prelude::*;

fn insight() -> Command {
    Command::cargo_bin("insight").expect("binary should build")
}

#[test]
fn test_help_lists_every_subcommand() {
    insight()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("submit"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"));
}

#[test]
fn test_submit_requires_a_dataset() {
    insight()
        .args(["submit", "Total revenue by region"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--dataset"));
}

#[test]
fn test_submit_accepts_repeated_datasets_in_help() {
    insight()
        .args(["submit", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dataset"))
        .stdout(predicate::str::contains("--execute"))
        .stdout(predicate::str::contains("--no-render"));
}

#[test]
fn test_show_requires_a_prompt_id() {
    insight()
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PROMPT_ID"));
}

#[test]
fn test_list_rejects_unknown_flags() {
    insight()
        .args(["list", "--frobnicate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}
