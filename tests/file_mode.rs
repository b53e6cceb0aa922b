//! In-place file rewriting.

use multireplace::{compile, FileError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_rewrite_in_place() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.txt");
    fs::write(&file, "hello world\nsecond hello\n").unwrap();

    let automaton = compile([("hello", "hi"), ("world", "earth")]).unwrap();
    assert!(automaton.transform_file(&file).unwrap());

    assert_eq!(fs::read_to_string(&file).unwrap(), "hi earth\nsecond hi\n");
    assert_eq!(dir_listing(dir.path()), vec!["notes.txt"]);
}

#[test]
fn test_missing_trailing_newline_preserved() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.txt");
    fs::write(&file, "a\nb").unwrap();

    let automaton = compile([("b", "c")]).unwrap();
    assert!(automaton.transform_file(&file).unwrap());
    assert_eq!(fs::read(&file).unwrap(), b"a\nc");
}

#[test]
fn test_zero_matches_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.txt");
    fs::write(&file, "nothing to replace\n").unwrap();
    let before = fs::metadata(&file).unwrap();

    let automaton = compile([("xyz", "abc")]).unwrap();
    assert!(!automaton.transform_file(&file).unwrap());

    let after = fs::metadata(&file).unwrap();
    assert_eq!(fs::read_to_string(&file).unwrap(), "nothing to replace\n");
    assert_eq!(after.permissions(), before.permissions());
    assert_eq!(after.modified().unwrap(), before.modified().unwrap());
    assert_eq!(dir_listing(dir.path()), vec!["notes.txt"]);
}

#[test]
fn test_empty_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("empty.txt");
    fs::write(&file, "").unwrap();

    let automaton = compile([("a", "b")]).unwrap();
    assert!(!automaton.transform_file(&file).unwrap());
    assert_eq!(fs::read(&file).unwrap(), b"");
}

#[cfg(unix)]
#[test]
fn test_mode_bits_preserved() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("run.sh");
    fs::write(&file, "#!/bin/sh\necho hello\n").unwrap();
    fs::set_permissions(&file, fs::Permissions::from_mode(0o700)).unwrap();

    let automaton = compile([("hello", "hi")]).unwrap();
    assert!(automaton.transform_file(&file).unwrap());

    let mode = fs::metadata(&file).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o700);
    assert_eq!(fs::read_to_string(&file).unwrap(), "#!/bin/sh\necho hi\n");
}

#[test]
fn test_missing_file_error() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("absent.txt");

    let automaton = compile([("a", "b")]).unwrap();
    let err = automaton.transform_file(&file).unwrap_err();
    assert!(matches!(err, FileError::Io { .. }));
    assert!(dir_listing(dir.path()).is_empty());
}

// A directory opens fine on Linux but fails on the first read, after the
// temporary file already exists next to it.
#[cfg(target_os = "linux")]
#[test]
fn test_read_failure_removes_temp_file() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("sub");
    fs::create_dir(&target).unwrap();

    let automaton = compile([("a", "b")]).unwrap();
    let err = automaton.transform_file(&target).unwrap_err();
    assert!(matches!(err, FileError::Io { .. }));
    assert_eq!(err.path(), target);
    assert_eq!(dir_listing(dir.path()), vec!["sub"]);
    assert!(dir_listing(&target).is_empty());
}
