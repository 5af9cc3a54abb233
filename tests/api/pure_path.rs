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

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use anypath::{ErrorKind, PathKind, PurePath};

#[test]
fn s3_path_parts() {
    let p = PurePath::s3("s3://bucket/dir/file.txt").unwrap();
    assert_eq!(p.kind(), PathKind::S3);
    assert_eq!(p.drive(), "s3://bucket");
    assert_eq!(p.root(), "/");
    assert_eq!(p.anchor(), "s3://bucket/");
    assert_eq!(p.parts(), ["s3://bucket/", "dir", "file.txt"]);
    assert_eq!(p.bucket(), "bucket");
    assert_eq!(p.key(), "dir/file.txt");
    assert_eq!(p.name(), "file.txt");
    assert_eq!(p.stem(), "file");
    assert_eq!(p.suffix(), ".txt");
    assert!(p.is_absolute());
    assert_eq!(p.to_string(), "s3://bucket/dir/file.txt");
}

#[test]
fn bucket_root() {
    let p = PurePath::gcs("gs://bucket").unwrap();
    assert_eq!(p.to_string(), "gs://bucket/");
    assert_eq!(p.bucket(), "bucket");
    assert_eq!(p.key(), "");
    assert_eq!(p.name(), "");
    assert_eq!(p.parent(), p);
    assert_eq!(p.parents().count(), 0);
}

#[test]
fn parents_walk_up_to_the_anchor() {
    let p = PurePath::posix("/a/b/c").unwrap();
    let parents: Vec<String> = p.parents().map(|p| p.to_string()).collect();
    assert_eq!(parents, ["/a/b", "/a", "/"]);
    let reversed: Vec<String> = p.parents().rev().map(|p| p.to_string()).collect();
    assert_eq!(reversed, ["/", "/a", "/a/b"]);
    assert_eq!(p.parents().len(), 3);
    assert_eq!(p.parents().get(-1).unwrap().to_string(), "/");
    assert_eq!(
        p.parents().get(3).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}

#[test]
fn join_with_absolute_argument_replaces() {
    let base = PurePath::s3("s3://bucket/a").unwrap();
    assert_eq!((&base / "b").unwrap().to_string(), "s3://bucket/a/b");
    assert_eq!((&base / "/b").unwrap().to_string(), "s3://bucket/b");
    assert_eq!(
        (&base / "s3://other/c").unwrap().to_string(),
        "s3://other/c"
    );
}

#[test]
fn join_rejects_foreign_scheme() {
    let base = PurePath::s3("s3://bucket/a").unwrap();
    let err = base.join(&["gs://other/c"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn windows_paths_fold_case() {
    let a = PurePath::windows(r"C:\Users\Foo").unwrap();
    let b = PurePath::windows("c:/users/foo").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_string(), r"C:\Users\Foo");
    assert_eq!(a.as_posix(), "C:/Users/Foo");
    let set: HashSet<PurePath> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn posix_paths_are_case_sensitive() {
    assert_ne!(
        PurePath::posix("/tmp/A").unwrap(),
        PurePath::posix("/tmp/a").unwrap()
    );
}

#[test]
fn windows_reserved_names() {
    assert!(PurePath::windows("c:/dir/NUL.txt").unwrap().is_reserved());
    assert!(!PurePath::windows("c:/dir/null.txt").unwrap().is_reserved());
    assert!(!PurePath::posix("/dev/nul").unwrap().is_reserved());
}

#[test]
fn relative_to_and_back() {
    let p = PurePath::s3("s3://bucket/a/b/c").unwrap();
    let rel = p.relative_to("s3://bucket/a").unwrap();
    assert_eq!(rel.to_string(), "b/c");
    assert!(!rel.is_absolute());
    assert!(p.is_relative_to("s3://bucket/"));
    assert!(!p.is_relative_to("s3://other/a"));
    assert_eq!(
        p.relative_to("s3://bucket/x").unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}

#[test]
fn with_name_stem_suffix() {
    let p = PurePath::gcs("gs://bucket/dir/data.tar.gz").unwrap();
    assert_eq!(
        p.with_name("other.txt").unwrap().to_string(),
        "gs://bucket/dir/other.txt"
    );
    assert_eq!(
        p.with_stem("new").unwrap().to_string(),
        "gs://bucket/dir/new.gz"
    );
    assert_eq!(
        p.with_suffix(".bz2").unwrap().to_string(),
        "gs://bucket/dir/data.tar.bz2"
    );
    assert_eq!(
        p.with_suffix("").unwrap().to_string(),
        "gs://bucket/dir/data.tar"
    );
    assert!(p.with_name("a/b").is_err());
    assert!(p.with_suffix("gz").is_err());
    assert!(PurePath::gcs("gs://bucket").unwrap().with_name("x").is_err());
}

#[test]
fn match_patterns() {
    let p = PurePath::s3("s3://bucket/logs/2024/app.log").unwrap();
    assert!(p.matches("*.log").unwrap());
    assert!(p.matches("2024/*.log").unwrap());
    assert!(!p.matches("logs/*.log").unwrap());
    assert!(p.matches("s3://bucket/logs/*/*.log").unwrap());
    assert!(!p.matches("s3://bucket/*.log").unwrap());
    assert!(!p.matches("/logs/*/*.log").unwrap());
    assert!(!p.matches("s3://other/logs/*/*.log").unwrap());
    assert!(PurePath::windows("C:/Dir/FILE.TXT")
        .unwrap()
        .matches("*.txt")
        .unwrap());
}

#[test]
fn lexical_resolve() {
    let p = PurePath::s3("s3://bucket/a/b/../../../c/./d").unwrap();
    assert_eq!(p.resolve().to_string(), "s3://bucket/c/d");
    let rel = PurePath::posix("../a/../b").unwrap();
    assert_eq!(rel.resolve().to_string(), "../b");
}

#[test]
fn as_uri() {
    assert_eq!(
        PurePath::posix("/tmp/a b").unwrap().as_uri().unwrap(),
        "file:///tmp/a%20b"
    );
    assert_eq!(
        PurePath::s3("s3://bucket/a b").unwrap().as_uri().unwrap(),
        "s3://bucket/a%20b"
    );
    assert_eq!(
        PurePath::posix("rel").unwrap().as_uri().unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}

#[test]
fn ordering_within_and_across_kinds() {
    let a = PurePath::s3("s3://bucket/a").unwrap();
    let b = PurePath::s3("s3://bucket/b").unwrap();
    assert!(a < b);
    let g = PurePath::gcs("gs://bucket/a").unwrap();
    assert_eq!(a.partial_cmp(&g), None);
    assert_eq!(a.try_cmp(&g).unwrap_err().kind(), ErrorKind::KindMismatch);
    assert_ne!(a, g);
}

#[test]
fn empty_path_is_dot() {
    let p = PurePath::posix("").unwrap();
    assert_eq!(p.to_string(), ".");
    assert!(p.segments().is_empty());
    assert_eq!(PurePath::http("./").unwrap().to_string(), ".");
}

proptest! {
    #[test]
    fn rendering_reparses_to_the_same_path(
        segments in proptest::collection::vec("[a-zA-Z0-9_.-]{1,8}", 0..5),
        absolute in any::<bool>(),
    ) {
        let joined = segments.join("/");
        let text = if absolute { format!("s3://bucket/{joined}") } else { joined };
        let path = PurePath::s3(&text).unwrap();
        let again = PurePath::s3(path.as_str()).unwrap();
        prop_assert_eq!(&again, &path);
        prop_assert_eq!(again.as_str(), path.as_str());
    }

    #[test]
    fn posix_parse_is_idempotent(s in "[a-z/.]{0,20}") {
        let path = PurePath::posix(&s).unwrap();
        let again = PurePath::posix(path.as_str()).unwrap();
        prop_assert_eq!(again.segments(), path.segments());
        prop_assert_eq!(again.root(), path.root());
    }
}
