//! End-to-end tests driving the `reyna` binary exactly as a user would:
//! write a source file to a temp directory, invoke the binary, assert on
//! stdout/exit code.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn reyna_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_reyna"))
}

fn write_source(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write fixture source");
    path
}

#[test]
fn help_output_mentions_reyna() {
    reyna_bin().arg("--help").assert().success().stdout(predicate::str::contains("reyna"));
}

#[test]
fn runs_a_hello_world_program() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "hello.reyna", r#"print "hello, world";"#);

    reyna_bin().arg(&path).assert().success().stdout(predicate::str::contains("hello, world"));
}

#[test]
fn check_flag_skips_execution() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "check.reyna", r#"print "should not print";"#);

    reyna_bin()
        .arg(&path)
        .arg("--check")
        .assert()
        .success()
        .stdout(predicate::str::contains("should not print").not());
}

#[test]
fn parse_error_exits_nonzero_and_reports_it() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "bad.reyna", "let = ;");

    reyna_bin().arg(&path).assert().code(1).stderr(predicate::str::is_empty().not());
}

#[test]
fn runtime_error_on_undefined_global_assignment() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "undefined.reyna", "undefined_name = 1;");

    reyna_bin().arg(&path).assert().code(2).stderr(predicate::str::contains("undefined variable"));
}

#[test]
fn jit_mode_is_refused_as_out_of_scope() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "ok.reyna", "print 1;");

    reyna_bin().arg(&path).arg("--mode").arg("jit").assert().code(3);
}

#[test]
fn missing_file_is_a_usage_error() {
    reyna_bin().arg("does-not-exist.reyna").assert().code(3);
}
