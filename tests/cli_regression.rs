// Regression tests for the wpp binary.
// Requires: assert_cmd, predicates, tempfile in [dev-dependencies]

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn wpp() -> Command {
    Command::cargo_bin("wpp").unwrap()
}

#[test]
fn ast_prints_statements() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("hello.wpp");
    fs::write(&file, "let greeting \"hello\"\n").unwrap();

    wpp()
        .arg("ast")
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("(let greeting \"hello\")"));
}

#[test]
fn ast_json_tags_node_kinds() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("hello.wpp");
    fs::write(&file, "let greeting \"hello\"\n").unwrap();

    wpp()
        .args(["ast", "--json"])
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("\"kind\": \"Var\"").and(contains("\"kind\": \"Str\"")));
}

#[test]
fn ast_json_reads_back_intrinsic_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("run.wpp");
    fs::write(&file, "run(\"ls\")\n").unwrap();

    let output = wpp().arg("ast").arg("--json").arg(&file).output().unwrap();
    assert!(output.status.success());

    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let call = &tree["nodes"][1];
    assert_eq!(call["kind"], "Intrinsic");
    assert_eq!(call["intrinsic"], "Run");
    assert_eq!(call["identifier"], "run");
}

#[test]
fn check_reports_failing_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("good.wpp"), "let x \"a\"\n").unwrap();
    fs::write(dir.path().join("bad.wpp"), "let 1\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "let 1\n").unwrap();

    wpp()
        .arg("check")
        .arg(dir.path())
        .args(["--inline", "--color", "never", "--root"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(contains(
            "error: bad.wpp:1:5 => expecting an identifier to follow `let`",
        ))
        .stdout(contains("2 file(s) checked, 1 with errors"));
}

#[test]
fn check_passes_clean_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("good.wpp"), "let f(a) { a }\nf(\"x\")\n").unwrap();

    wpp()
        .arg("check")
        .arg(dir.path())
        .args(["--color", "never"])
        .assert()
        .success()
        .stdout(contains("ok: 1 file(s) checked, 0 with errors"));
}

#[test]
fn unknown_warning_category_is_rejected() {
    wpp()
        .args(["-W", "bogus", "check", "."])
        .assert()
        .failure()
        .stderr(contains("unknown warning category 'bogus'"));
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.wpp");

    wpp()
        .args(["--color", "never", "ast"])
        .arg(&missing)
        .assert()
        .failure()
        .stderr(contains("cannot read"));
}
