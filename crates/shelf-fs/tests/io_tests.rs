use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use shelf_fs::{Error, Filesystem, LocalFs, NormalizedPath, io};
use std::fs;
use std::path::Path;

#[test]
fn test_write_atomic_creates_file() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("test.txt"));

    io::write_atomic(&path, b"hello world").unwrap();

    temp.child("test.txt").assert("hello world");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    temp.child("test.txt").write_str("original").unwrap();

    let path = NormalizedPath::new(temp.path().join("test.txt"));
    io::write_atomic(&path, b"updated").unwrap();

    temp.child("test.txt").assert("updated");
}

#[test]
fn test_write_text_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("nested/dir/gitshelf.yml"));

    io::write_text(&path, "books: []\n").unwrap();

    temp.child("nested/dir/gitshelf.yml").assert("books: []\n");
}

#[test]
fn test_read_text_nonexistent_file() {
    let path = NormalizedPath::new("/nonexistent/file.txt");
    let result = io::read_text(&path);
    assert!(matches!(result, Err(Error::Io { .. })));
}

#[test]
fn test_make_dirs_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("a/b/c");

    LocalFs.make_dirs(&dir).unwrap();
    LocalFs.make_dirs(&dir).unwrap();

    temp.child("a/b/c").assert(predicate::path::is_dir());
}

#[test]
fn test_make_dirs_empty_path_is_noop() {
    LocalFs.make_dirs(Path::new("")).unwrap();
}

#[test]
fn test_make_dirs_fails_on_file() {
    let temp = TempDir::new().unwrap();
    temp.child("occupied").write_str("x").unwrap();

    let result = LocalFs.make_dirs(&temp.path().join("occupied"));
    assert!(matches!(result, Err(Error::NotADirectory { .. })));
}

#[cfg(unix)]
#[test]
fn test_symlink_roundtrip_keeps_literal_target() {
    let temp = TempDir::new().unwrap();
    temp.child("vendor").create_dir_all().unwrap();
    let link = temp.path().join("vendor/shared");

    LocalFs
        .create_symlink(Path::new("../common/shared"), &link)
        .unwrap();

    assert!(LocalFs.is_symlink(&link));
    // The target does not exist, yet the link itself does
    assert!(LocalFs.exists(&link));
    assert!(!link.exists());
    assert_eq!(
        LocalFs.read_link(&link).unwrap(),
        Path::new("../common/shared")
    );
}

#[cfg(unix)]
#[test]
fn test_remove_entry_removes_symlink_only() {
    let temp = TempDir::new().unwrap();
    temp.child("real").create_dir_all().unwrap();
    let link = temp.path().join("link");
    LocalFs.create_symlink(Path::new("real"), &link).unwrap();

    LocalFs.remove_entry(&link).unwrap();

    temp.child("link").assert(predicate::path::missing());
    temp.child("real").assert(predicate::path::is_dir());
}

#[test]
fn test_remove_entry_refuses_directory() {
    let temp = TempDir::new().unwrap();
    temp.child("real").create_dir_all().unwrap();

    let result = LocalFs.remove_entry(&temp.path().join("real"));

    assert!(matches!(result, Err(Error::IsADirectory { .. })));
    assert!(fs::metadata(temp.path().join("real")).unwrap().is_dir());
}
