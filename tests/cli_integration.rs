//! Command-line interface, run through the built binary.

use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn multireplace() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_multireplace"));
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn run_with_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = multireplace()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // The child may exit before reading stdin (e.g. on argument errors).
    if let Err(e) = child.stdin.take().unwrap().write_all(stdin.as_bytes()) {
        assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe, "{e}");
    }
    child.wait_with_output().unwrap()
}

#[test]
fn test_help() {
    let output = multireplace().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--rules"));
    assert!(stdout.contains("--dry-run"));
}

#[test]
fn test_version() {
    let output = multireplace().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_stdin_to_stdout() {
    let output = run_with_stdin(&["hello", "hi", "world", "earth"], "hello world\nbye world");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hi earth\nbye earth");
}

#[test]
fn test_odd_arguments_exit_1() {
    let output = run_with_stdin(&["a", "b", "c"], "abc\n");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("pairs"));
}

#[test]
fn test_empty_pattern_exit_1() {
    let output = run_with_stdin(&["", "x"], "abc\n");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_unknown_flag_exit_1() {
    let output = multireplace().arg("--bogus").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_rewrites_files() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, "colour\n").unwrap();
    fs::write(&b, "plain\n").unwrap();

    let output = multireplace()
        .args(["colour", "color", "--"])
        .arg(&a)
        .arg(&b)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&a).unwrap(), "color\n");
    assert_eq!(fs::read_to_string(&b).unwrap(), "plain\n");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("a.txt: converted"));
    assert!(!stdout.contains("b.txt"));
}

#[test]
fn test_silent() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.txt");
    fs::write(&a, "colour\n").unwrap();

    let output = multireplace()
        .args(["-s", "colour", "color", "--"])
        .arg(&a)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert_eq!(fs::read_to_string(&a).unwrap(), "color\n");
}

#[test]
fn test_dry_run_with_diff() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.txt");
    fs::write(&a, "keep\ncolour\n").unwrap();

    let output = multireplace()
        .args(["-n", "-d", "colour", "color", "--"])
        .arg(&a)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&a).unwrap(), "keep\ncolour\n");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-colour"));
    assert!(stdout.contains("+color"));
    assert!(stdout.contains("@@ -1,2 +1,2 @@"));
    assert!(stdout.contains("would convert"));
}

#[test]
fn test_missing_file_exit_2_but_others_processed() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.txt");
    let present = dir.path().join("present.txt");
    fs::write(&present, "colour\n").unwrap();

    let output = multireplace()
        .args(["colour", "color", "--"])
        .arg(&missing)
        .arg(&present)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(fs::read_to_string(&present).unwrap(), "color\n");
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.txt"));
}

#[test]
fn test_directory_needs_recursive() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let nested = dir.path().join("sub/n.txt");
    fs::write(&nested, "colour\n").unwrap();

    let output = multireplace()
        .args(["colour", "color", "--"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(fs::read_to_string(&nested).unwrap(), "colour\n");

    let output = multireplace()
        .args(["-r", "colour", "color", "--"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&nested).unwrap(), "color\n");
}

#[test]
fn test_rules_file() {
    let dir = TempDir::new().unwrap();
    let rules = dir.path().join("rules.toml");
    fs::write(
        &rules,
        "[[rules]]\nfrom = \"\\\\bcolour\\\\b\"\nto = \"color\"\n",
    )
    .unwrap();

    let output = run_with_stdin(
        &["-f", rules.to_str().unwrap()],
        "colour colourful\n",
    );
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "color colourful\n");
}

#[test]
fn test_invalid_rules_file_exit_1() {
    let dir = TempDir::new().unwrap();
    let rules = dir.path().join("rules.toml");
    fs::write(&rules, "[options]\n").unwrap();

    let output = run_with_stdin(&["-f", rules.to_str().unwrap()], "x\n");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("rules.toml"));
}
