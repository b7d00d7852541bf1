//! CLI parsing tests for the mnemolite command.
//!
//! These only exercise clap's argument parsing (help/version/usage errors) -
//! the subcommands themselves need a live Postgres + Redis and are covered
//! by each crate's own integration tests instead.

use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn mnemolite() -> Command {
    Command::cargo_bin("mnemolite").expect("failed to find mnemolite binary")
}

#[test]
fn help_lists_all_commands() {
    mnemolite()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("produce"))
        .stdout(predicate::str::contains("consume"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("graph-build"))
        .stdout(predicate::str::contains("mcp"));
}

#[test]
fn version_flag_reports_package_version() {
    mnemolite()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mnemolite"));
}

#[test]
fn global_options_in_help() {
    mnemolite()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--database-url"))
        .stdout(predicate::str::contains("--redis-url"))
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("--quiet"));
}

#[test]
fn produce_requires_root_and_repository() {
    mnemolite()
        .arg("produce")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn consume_requires_repository() {
    mnemolite()
        .arg("consume")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn search_requires_query() {
    mnemolite()
        .arg("search")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn status_requires_repository() {
    mnemolite()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn graph_build_requires_repository() {
    mnemolite()
        .arg("graph-build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn unknown_subcommand_fails() {
    mnemolite()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized"));
}

#[test]
fn search_help_lists_filters() {
    mnemolite()
        .args(["search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--repository"))
        .stdout(predicate::str::contains("--language"))
        .stdout(predicate::str::contains("--no-rerank"));
}
