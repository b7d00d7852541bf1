//! End-to-end CLI workflows against live Postgres + Redis.
//!
//! Ignored by default (needs `DATABASE_URL`/`REDIS_URL` pointing at a real
//! MnemoLite schema) - run explicitly with `cargo test -- --ignored`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[allow(deprecated)]
fn mnemolite() -> Command {
    Command::cargo_bin("mnemolite").expect("failed to find mnemolite binary")
}

fn sample_repo() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    std::fs::write(
        dir.path().join("lib.rs"),
        "pub fn greet(name: &str) -> String {\n    format!(\"hello, {name}\")\n}\n",
    )
    .unwrap();
    dir
}

#[test]
#[ignore]
fn produce_then_status_reports_progress() {
    let repo = sample_repo();

    mnemolite()
        .args(["produce", repo.path().to_str().unwrap(), "--repository", "it-produce-status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enqueued job"));

    mnemolite()
        .args(["status", "it-produce-status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexing status"));
}

#[test]
#[ignore]
fn status_reports_not_found_for_unknown_repository() {
    mnemolite()
        .args(["status", "it-does-not-exist"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No indexing job found"));
}

#[test]
#[ignore]
fn search_reports_no_results_against_an_empty_repository() {
    mnemolite()
        .args(["search", "a query nothing will match", "--repository", "it-empty-repo"])
        .assert()
        .success();
}
