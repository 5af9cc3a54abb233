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

//! Emulated directories on an in-memory object store, through [Path].

use std::collections::BTreeSet;
use std::sync::Arc;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use anypath::backend::record::{Call, Verb};
use anypath::{Backend, ErrorKind, MemoryBackend, Path, PathKind, RecordingBackend};

fn memory_bucket(page_size: usize) -> (Arc<MemoryBackend>, Path) {
    let backend = Arc::new(MemoryBackend::with_page_size(page_size));
    let root = Path::of_kind(PathKind::S3, &["s3://bucket"])
        .unwrap()
        .with_client(backend.clone());
    (backend, root)
}

fn names(dir: &Path) -> BTreeSet<String> {
    dir.iterdir()
        .unwrap()
        .map(|p| p.unwrap().name().to_owned())
        .collect()
}

#[test]
fn build_and_list_a_tree() {
    let (backend, root) = memory_bucket(1000);
    let data = root.join(&["data", "2024"]).unwrap();
    assert_eq!(
        data.mkdir(false, false).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    data.mkdir(true, false).unwrap();
    assert!(data.is_dir().unwrap());
    assert!(data.parent().is_dir().unwrap());

    (&data / "a.csv").unwrap().write_text("1,2\n").unwrap();
    (&data / "b.csv").unwrap().touch(true).unwrap();
    data.join(&["sub"]).unwrap().mkdir(false, false).unwrap();

    assert_eq!(
        backend.keys("bucket"),
        [
            "data/",
            "data/2024/",
            "data/2024/a.csv",
            "data/2024/b.csv",
            "data/2024/sub/"
        ]
    );
    assert_eq!(
        names(&data),
        BTreeSet::from(["a.csv", "b.csv", "sub"].map(String::from))
    );
    assert_eq!(names(&root), BTreeSet::from(["data".to_owned()]));
    assert!(data.join(&["sub"]).unwrap().is_dir().unwrap());
    assert!(!data.join(&["sub"]).unwrap().is_file().unwrap());
    assert!((&data / "a.csv").unwrap().is_file().unwrap());
}

#[test]
fn listing_spans_many_pages() {
    let (backend, root) = memory_bucket(2);
    let dir = (&root / "many").unwrap();
    dir.mkdir(false, false).unwrap();
    for i in 0..7 {
        dir.join(&[format!("f{i}")]).unwrap().touch(true).unwrap();
    }
    let listed = names(&dir);
    assert_eq!(listed.len(), 7);
    assert!(listed.contains("f6"));

    dir.rmdir().unwrap();
    assert!(backend.keys("bucket").is_empty());
    assert!(!dir.exists().unwrap());
}

#[test]
fn mkdir_exist_ok() {
    let (_backend, root) = memory_bucket(1000);
    let dir = (&root / "d").unwrap();
    dir.mkdir(false, false).unwrap();
    assert_eq!(
        dir.mkdir(false, false).unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );
    dir.mkdir(false, true).unwrap();

    let file = (&root / "f").unwrap();
    file.write_bytes(b"x").unwrap();
    assert_eq!(
        file.mkdir(false, true).unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );
}

#[test]
fn bucket_root_is_a_protected_directory() {
    let (_backend, root) = memory_bucket(1000);
    assert!(root.exists().unwrap());
    assert!(root.is_dir().unwrap());
    assert!(!root.is_file().unwrap());
    assert_eq!(root.rmdir().unwrap_err().kind(), ErrorKind::PermissionDenied);
    assert_eq!(
        root.touch(true).unwrap_err().kind(),
        ErrorKind::PermissionDenied
    );
    assert_eq!(
        root.read_bytes().unwrap_err().kind(),
        ErrorKind::PermissionDenied
    );
}

#[test]
fn unlink_files_not_directories() {
    let (_backend, root) = memory_bucket(1000);
    let dir = (&root / "d").unwrap();
    dir.mkdir(false, false).unwrap();
    assert_eq!(
        dir.unlink(false).unwrap_err().kind(),
        ErrorKind::PermissionDenied
    );
    let file = (&dir / "f").unwrap();
    assert_eq!(file.unlink(false).unwrap_err().kind(), ErrorKind::NotFound);
    file.unlink(true).unwrap();
    file.write_text("x").unwrap();
    file.unlink(false).unwrap();
    assert!(!file.exists().unwrap());
    assert_eq!(file.rmdir().unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn rmdir_of_a_file_is_not_a_directory() {
    let (_backend, root) = memory_bucket(1000);
    let file = (&root / "f").unwrap();
    file.write_text("x").unwrap();
    assert_eq!(file.rmdir().unwrap_err().kind(), ErrorKind::NotADirectory);
}

#[test]
fn touch_refreshes_existing_object_in_place() {
    let backend = Arc::new(MemoryBackend::new());
    let recording = Arc::new(RecordingBackend::new(backend.clone()));
    let file = Path::parse("s3://bucket/f")
        .unwrap()
        .with_client(recording.clone());
    file.write_text("keep me").unwrap();
    let before = backend.head("bucket", "f").unwrap().unwrap().modified;
    recording.take_recorded_calls();

    file.touch(true).unwrap();
    assert_eq!(
        recording.take_recorded_calls(),
        [Call::new(Verb::Copy, "f")]
    );
    let after = backend.head("bucket", "f").unwrap().unwrap().modified;
    assert!(after > before);
    assert_eq!(file.read_text().unwrap(), "keep me");

    assert_eq!(
        file.touch(false).unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );
}

#[test]
fn touch_needs_parent_directory() {
    let (_backend, root) = memory_bucket(1000);
    let file = root.join(&["missing", "f"]).unwrap();
    assert_eq!(file.touch(true).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn missing_bucket_name_is_invalid() {
    let backend = Arc::new(MemoryBackend::new());
    let path = Path::of_kind(PathKind::S3, &["relative/key"])
        .unwrap()
        .with_client(backend);
    assert_matches!(path.exists(), Err(err) if err.kind() == ErrorKind::InvalidArgument);
}

#[test]
fn object_store_paths_lack_posix_metadata() {
    let (_backend, root) = memory_bucket(1000);
    let file = (&root / "f").unwrap();
    for err in [
        file.stat().unwrap_err(),
        file.owner().unwrap_err(),
        file.is_symlink().unwrap_err(),
        file.glob("*").unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }
}
