//! Integration tests for the `strata` CLI binary.
//!
//! Every test reads records from a temporary JSON file, so nothing here
//! needs network access or touches the user's real configuration.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::NamedTempFile;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `strata` binary with env isolation.
///
/// Clears all `STRATA_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn strata_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("strata");
    cmd.env("HOME", "/tmp/strata-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/strata-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("STRATA_SOURCE")
        .env_remove("STRATA_URL")
        .env_remove("STRATA_API_KEY")
        .env_remove("STRATA_CONFIG")
        .env_remove("STRATA_OUTPUT")
        .env_remove("STRATA_INSECURE")
        .env_remove("STRATA_TIMEOUT");
    cmd
}

fn records_file(records: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(records.to_string().as_bytes()).unwrap();
    file
}

fn people() -> NamedTempFile {
    records_file(&json!([
        {"id": 1, "name": "John", "age": 30, "parentId": null},
        {"id": 2, "name": "Jane", "age": 25, "parentId": 1},
        {"id": 3, "name": "Jim", "age": 41, "parentId": 2},
        {"id": 4, "name": "Lost", "age": 50, "parentId": 99}
    ]))
}

/// Run with `--source <file> --output json` and parse stdout.
fn json_output(file: &NamedTempFile, args: &[&str]) -> Value {
    let output = strata_cmd()
        .arg("--source")
        .arg(file.path())
        .args(["--output", "json-compact"])
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = strata_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = String::from_utf8_lossy(&output.stderr);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    strata_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("query")
            .and(predicate::str::contains("tree"))
            .and(predicate::str::contains("path"))
            .and(predicate::str::contains("descendants")),
    );
}

#[test]
fn test_completions_bash() {
    strata_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("strata"));
}

#[test]
fn test_missing_source_is_usage_error() {
    strata_cmd()
        .arg("query")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No record source configured"));
}

// ── Query ───────────────────────────────────────────────────────────

#[test]
fn test_query_sort() {
    let file = people();
    let out = json_output(&file, &["query", "--sort", "age"]);
    assert_eq!(ids(&out), vec![2, 1, 3, 4]);
}

#[test]
fn test_query_filter_and_sort_desc() {
    let file = people();
    let out = json_output(
        &file,
        &["query", "-f", "age:gte:28", "-f", "name:like:j", "-S", "age:desc"],
    );
    assert_eq!(ids(&out), vec![3, 1]);
}

#[test]
fn test_query_count() {
    let file = people();
    strata_cmd()
        .arg("--source")
        .arg(file.path())
        .args(["query", "--filter", "id:in:1,2", "--count"])
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn test_query_plain_prints_ids() {
    let file = people();
    strata_cmd()
        .arg("--source")
        .arg(file.path())
        .args(["-o", "plain", "query", "--limit", "2"])
        .assert()
        .success()
        .stdout("1\n2\n");
}

#[test]
fn test_query_table() {
    let file = people();
    strata_cmd()
        .arg("--source")
        .arg(file.path())
        .args(["query", "--columns", "id,name"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("NAME")
                .and(predicate::str::contains("Jane"))
                .and(predicate::str::contains("AGE").not()),
        );
}

#[test]
fn test_invalid_filter_operator() {
    let file = people();
    strata_cmd()
        .arg("--source")
        .arg(file.path())
        .args(["query", "--filter", "age:between:3"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown operator"));
}

// ── Tree ────────────────────────────────────────────────────────────

#[test]
fn test_tree_json_drops_orphans() {
    let file = people();
    let out = json_output(&file, &["tree"]);
    assert_eq!(ids(&out), vec![1]);
    assert_eq!(out[0]["children"][0]["id"], json!(2));
    assert_eq!(out[0]["children"][0]["children"][0]["id"], json!(3));
}

#[test]
fn test_tree_text() {
    let file = people();
    strata_cmd()
        .arg("--source")
        .arg(file.path())
        .arg("tree")
        .assert()
        .success()
        .stdout("John (1)\n└── Jane (2)\n    └── Jim (3)\n");
}

#[test]
fn test_tree_custom_fields() {
    let file = records_file(&json!([
        {"key": "a", "up": null},
        {"key": "b", "up": "a"}
    ]));
    let out = json_output(
        &file,
        &[
            "--id-field",
            "key",
            "--parent-field",
            "up",
            "--children-field",
            "kids",
            "tree",
        ],
    );
    assert_eq!(out[0]["kids"][0]["key"], json!("b"));
}

#[test]
fn test_path_and_descendants() {
    let file = people();
    assert_eq!(ids(&json_output(&file, &["path", "3"])), vec![1, 2, 3]);
    assert_eq!(ids(&json_output(&file, &["descendants", "1"])), vec![2, 3]);
    assert_eq!(ids(&json_output(&file, &["children", "1"])), vec![2]);
    assert_eq!(ids(&json_output(&file, &["roots"])), vec![1]);
}

#[test]
fn test_get_missing_record() {
    let file = people();
    strata_cmd()
        .arg("--source")
        .arg(file.path())
        .args(["get", "42"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Record '42' not found"));
}

#[test]
fn test_envelope_source() {
    let file = records_file(&json!({"data": [{"id": 7, "name": "Only"}]}));
    let out = json_output(&file, &["get", "7"]);
    assert_eq!(out["name"], json!("Only"));
}

#[test]
fn test_malformed_source() {
    let file = records_file(&json!({"rows": []}));
    strata_cmd()
        .arg("--source")
        .arg(file.path())
        .arg("query")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("are not valid"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_init_show_and_reuse() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let records = people();

    strata_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    strata_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("already exists"));

    std::fs::write(
        &config,
        format!(
            "[source]\nfile = {:?}\napi_key = \"hunter2\"\n\n[store]\nparent_field = \"parentId\"\n",
            records.path().display().to_string()
        ),
    )
    .unwrap();

    strata_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****").and(predicate::str::contains("hunter2").not()));

    strata_cmd()
        .arg("--config")
        .arg(&config)
        .args(["-o", "plain", "roots"])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn test_config_path_honours_flag() {
    strata_cmd()
        .args(["--config", "/tmp/strata-somewhere/config.toml", "config", "path"])
        .assert()
        .success()
        .stdout("/tmp/strata-somewhere/config.toml\n");
}
