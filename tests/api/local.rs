// Copyright 2025 Martin Pool.

// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

//! Local filesystem paths.

use assert_fs::prelude::*;
use assert_fs::TempDir;
use pretty_assertions::assert_eq;

use anypath::{ErrorKind, Path, PathKind};

fn temp_path(temp: &TempDir) -> Path {
    Path::from_local(temp.path()).unwrap()
}

#[test]
fn local_kind_matches_host() {
    let temp = TempDir::new().unwrap();
    assert_eq!(temp_path(&temp).kind(), PathKind::host_local());
}

#[test]
fn create_list_and_remove() {
    let temp = TempDir::new().unwrap();
    let base = temp_path(&temp);
    let dir = base.join(&["a", "b"]).unwrap();
    assert_eq!(
        dir.mkdir(false, false).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    dir.mkdir(true, false).unwrap();
    dir.mkdir(true, true).unwrap();
    assert_eq!(
        dir.mkdir(false, false).unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );
    temp.child("a/b").assert(predicates::path::is_dir());

    let file = (&dir / "hello.txt").unwrap();
    file.write_text("hello").unwrap();
    temp.child("a/b/hello.txt").assert("hello");
    assert!(file.is_file().unwrap());
    assert!(file.exists().unwrap());
    assert_eq!(file.read_text().unwrap(), "hello");

    let mut children: Vec<String> = dir
        .iterdir()
        .unwrap()
        .map(|p| p.unwrap().name().to_owned())
        .collect();
    children.sort();
    assert_eq!(children, ["hello.txt"]);

    assert_eq!(dir.rmdir().unwrap_err().kind(), ErrorKind::Other);
    file.unlink(false).unwrap();
    file.unlink(true).unwrap();
    assert_eq!(file.unlink(false).unwrap_err().kind(), ErrorKind::NotFound);
    dir.rmdir().unwrap();
    assert!(!dir.exists().unwrap());
    temp.close().unwrap();
}

#[test]
fn touch_keeps_content() {
    let temp = TempDir::new().unwrap();
    temp.child("f").write_str("content").unwrap();
    let file = (&temp_path(&temp) / "f").unwrap();
    file.touch(true).unwrap();
    temp.child("f").assert("content");
    assert_eq!(
        file.touch(false).unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );
    let new = (&temp_path(&temp) / "new").unwrap();
    new.touch(false).unwrap();
    temp.child("new").assert("");
}

#[test]
fn glob_and_rglob() {
    let temp = TempDir::new().unwrap();
    temp.child("top.rs").touch().unwrap();
    temp.child("notes.txt").touch().unwrap();
    temp.child("src/lib.rs").touch().unwrap();
    temp.child("src/deep/mod.rs").touch().unwrap();
    let base = temp_path(&temp);

    let names = |found: Vec<Path>| -> Vec<String> {
        let mut names: Vec<String> = found
            .iter()
            .map(|p| p.relative_to(base.as_str()).unwrap().as_posix())
            .collect();
        names.sort();
        names
    };
    assert_eq!(names(base.glob("*.rs").unwrap()), ["top.rs"]);
    assert_eq!(names(base.glob("src/*.rs").unwrap()), ["src/lib.rs"]);
    assert_eq!(
        names(base.rglob("*.rs").unwrap()),
        ["src/deep/mod.rs", "src/lib.rs", "top.rs"]
    );
    assert_eq!(
        base.glob("/abs/*").unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}

#[test]
fn resolve_and_absolute() {
    let temp = TempDir::new().unwrap();
    temp.child("d").create_dir_all().unwrap();
    let base = temp_path(&temp).resolve().unwrap();
    let odd = base.join(&["d", "..", "d"]).unwrap();
    assert_eq!(odd.resolve().unwrap(), (&base / "d").unwrap());
    assert!(odd.absolute().unwrap().is_absolute());
}

#[cfg(unix)]
#[test]
fn symlinks() {
    let temp = TempDir::new().unwrap();
    temp.child("target").write_str("t").unwrap();
    let base = temp_path(&temp).resolve().unwrap();
    let link = (&base / "link").unwrap();
    let target = (&base / "target").unwrap();
    link.symlink_to(target.as_str()).unwrap();
    assert!(link.is_symlink().unwrap());
    assert!(!target.is_symlink().unwrap());
    assert_eq!(link.readlink().unwrap(), target);
    assert!(link.samefile(&target).unwrap());
    assert_eq!(link.read_text().unwrap(), "t");
    assert!(link.lstat().unwrap().file_type().is_symlink());
    assert!(link.stat().unwrap().is_file());
}

#[cfg(unix)]
#[test]
fn chmod_changes_mode() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    temp.child("f").touch().unwrap();
    let file = (&temp_path(&temp) / "f").unwrap();
    file.chmod(0o600).unwrap();
    assert_eq!(file.stat().unwrap().permissions().mode() & 0o777, 0o600);
    assert_eq!(
        file.lchmod(0o600).unwrap_err().kind(),
        ErrorKind::Unsupported
    );
}

#[test]
fn rename_moves_file() {
    let temp = TempDir::new().unwrap();
    temp.child("a").write_str("x").unwrap();
    let base = temp_path(&temp);
    let dest = (&base / "b").unwrap();
    let renamed = (&base / "a").unwrap().rename(dest.as_str()).unwrap();
    assert_eq!(renamed, dest);
    temp.child("a").assert(predicates::path::missing());
    temp.child("b").assert("x");
}
