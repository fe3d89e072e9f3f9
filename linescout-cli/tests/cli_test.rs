use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn linescout() -> Command {
    Command::cargo_bin("linescout").unwrap()
}

#[test]
fn test_match_found_exits_zero() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello world\n").unwrap();

    linescout()
        .arg("hello")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("hello world"));
}

#[test]
fn test_no_match_exits_one() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello world\n").unwrap();

    linescout()
        .arg("absent")
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_count_only_prints_total() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "x\ny\nx\n").unwrap();

    linescout()
        .args(["--count", "x"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::diff("2\n"));
}

#[test]
fn test_quiet_suppresses_output_keeps_status() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "present\n").unwrap();

    linescout()
        .args(["--quiet", "present"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    linescout()
        .args(["--quiet", "absent"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_line_numbers_and_no_filename() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "first\nsecond needle\n").unwrap();

    linescout()
        .args(["-n", "--no-filename", "needle"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::diff("2:second needle\n"));
}

#[test]
fn test_invalid_pattern_reports_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "content\n").unwrap();

    linescout()
        .arg("broken(")
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Invalid pattern"));
}

#[test]
fn test_pcre2_engine_selection() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "id=42\n").unwrap();

    linescout()
        .args(["--engine", "pcre2", r"id=\d+"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("id=42"));

    linescout()
        .args(["--engine", "re2", "id"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown matcher engine"));
}

#[test]
fn test_gitignore_rules_apply() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();
    fs::write(dir.path().join("keep.txt"), "needle\n").unwrap();
    fs::write(dir.path().join("skip.log"), "needle\n").unwrap();

    linescout()
        .arg("needle")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("keep.txt"))
        .stdout(predicate::str::contains("skip.log").not());
}
