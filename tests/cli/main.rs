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

//! Run the anypath CLI as a subprocess and test it.

use std::process::Command;

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use indoc::indoc;
use predicates::prelude::*;

fn run_anypath() -> Command {
    Command::cargo_bin("anypath").expect("locate anypath binary")
}

#[test]
fn no_args() {
    run_anypath()
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn version() {
    run_anypath()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn parse_s3_path() {
    run_anypath()
        .args(["parse", "s3://bucket/dir/file.tar.gz"])
        .assert()
        .success()
        .stdout(indoc! { r#"
            kind: s3
            path: s3://bucket/dir/file.tar.gz
            drive: s3://bucket
            root: /
            anchor: s3://bucket/
            parts: ["s3://bucket/", "dir", "file.tar.gz"]
            name: file.tar.gz
            suffix: .gz
            parent: s3://bucket/dir
            uri: s3://bucket/dir/file.tar.gz
        "# });
}

#[test]
fn parse_joins_arguments() {
    run_anypath()
        .args(["parse", "ignored", "gs://bucket/a", "b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("path: gs://bucket/a/b\n"));
}

#[test]
fn cat_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    run_anypath()
        .args(["cat", temp.child("nothing").path().to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn local_file_lifecycle() {
    let temp = TempDir::new().unwrap();
    let dir = temp.child("d/e");
    let dir_arg = dir.path().to_str().unwrap();
    let file = dir.child("f.txt");
    let file_arg = file.path().to_str().unwrap();

    run_anypath()
        .args(["mkdir", dir_arg])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
    run_anypath()
        .args(["mkdir", "-p", dir_arg])
        .assert()
        .success();
    run_anypath()
        .args(["mkdir", "--exist-ok", dir_arg])
        .assert()
        .success();
    dir.assert(predicate::path::is_dir());

    run_anypath()
        .args(["write", file_arg, "hello"])
        .assert()
        .success();
    run_anypath()
        .args(["cat", file_arg])
        .assert()
        .success()
        .stdout("hello");
    run_anypath()
        .args(["exists", file_arg])
        .assert()
        .success()
        .stdout("true\n");
    run_anypath()
        .args(["ls", dir_arg])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("f.txt\n"));
    run_anypath()
        .args(["touch", "--no-exist-ok", file_arg])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Already exists"));

    run_anypath().args(["rm", file_arg]).assert().success();
    run_anypath()
        .args(["exists", file_arg])
        .assert()
        .success()
        .stdout("false\n");
    run_anypath()
        .args(["rm", file_arg])
        .assert()
        .failure();
    run_anypath().args(["rm", "-f", file_arg]).assert().success();
    run_anypath().args(["rmdir", dir_arg]).assert().success();
    dir.assert(predicate::path::missing());
    temp.close().unwrap();
}

#[test]
fn touch_creates_empty_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("new");
    run_anypath()
        .args(["touch", file.path().to_str().unwrap()])
        .assert()
        .success();
    file.assert("");
}

#[test]
fn debug_flag_traces_to_stderr() {
    let temp = TempDir::new().unwrap();
    run_anypath()
        .args(["-D", "exists", temp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout("true\n")
        .stderr(predicate::str::contains("Tracing enabled"));
}

#[test]
fn trace_time_styles() {
    for style in ["none", "utc", "relative"] {
        run_anypath()
            .args(["-D", "--trace-time", style, "parse", "s3://bucket/key"])
            .assert()
            .success()
            .stdout(predicate::str::contains("kind: s3"))
            .stderr(predicate::str::contains("Tracing enabled"));
    }
}
