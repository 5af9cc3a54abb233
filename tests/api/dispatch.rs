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

//! Choosing the kind of a path from its scheme.

use std::sync::Arc;

use rstest::rstest;

use anypath::{
    register_client, register_path_kind, register_pure_kind, Flavour, MemoryBackend, Path,
    PathKind, PurePath, Registry, Store,
};

static MEM: Flavour = Flavour::object_store("mem", &["mem"]);
static MISSING: Flavour = Flavour::object_store("missing", &["missing"]);

#[rstest]
#[case("s3://bucket/key", PathKind::S3)]
#[case("gs://bucket/key", PathKind::GCS)]
#[case("https://example.com/a", PathKind::Http)]
#[case("HTTP://example.com/a", PathKind::Http)]
#[case("ftp://example.com/a", PathKind::Uri)]
#[case("relative/path", PathKind::host_local())]
#[case("/abs/path", PathKind::host_local())]
fn pure_kind_from_scheme(#[case] s: &str, #[case] kind: PathKind) {
    assert_eq!(PurePath::parse(s).unwrap().kind(), kind);
}

#[rstest]
#[case("s3://bucket/key", PathKind::S3)]
#[case("gs://bucket/key", PathKind::GCS)]
#[case("https://example.com/a", PathKind::Http)]
fn path_kind_from_scheme(#[case] s: &str, #[case] kind: PathKind) {
    assert_eq!(Path::parse(s).unwrap().kind(), kind);
}

#[test]
fn later_absolute_argument_chooses_kind() {
    let p = PurePath::new(&["relative", "s3://bucket/a"]).unwrap();
    assert_eq!(p.kind(), PathKind::S3);
    assert_eq!(p.to_string(), "s3://bucket/a");
}

#[test]
fn registry_prefers_most_recent() {
    let mut registry = Registry::new();
    registry.register(PathKind::Uri, false);
    registry.register(PathKind::S3, false);
    let (kind, parsed) = registry.dispatch(&["s3://b/k"]).unwrap();
    assert_eq!(kind, PathKind::S3);
    assert_eq!(parsed.drive, "s3://b");
    let (kind, _) = registry.dispatch(&["gs://b/k"]).unwrap();
    assert_eq!(kind, PathKind::Uri);
}

#[test]
fn custom_store_registered_globally() {
    let kind = PathKind::ObjectStore(Store::Custom(&MEM));
    register_pure_kind(kind, false);
    register_path_kind(kind, false);
    let backend = Arc::new(MemoryBackend::new());
    register_client(Store::Custom(&MEM), backend.clone());

    let pure = PurePath::parse("mem://bkt/x").unwrap();
    assert_eq!(pure.kind(), kind);
    let path = Path::parse("mem://bkt/x").unwrap();
    assert_eq!(path.kind(), kind);
    path.write_text("content").unwrap();
    assert_eq!(backend.keys("bkt"), ["x"]);
    assert_eq!(Path::parse("mem://bkt/x").unwrap().read_text().unwrap(), "content");
}

#[test]
fn missing_dependency_is_not_dispatched() {
    let kind = PathKind::ObjectStore(Store::Custom(&MISSING));
    register_path_kind(kind, true);
    let path = Path::parse("missing://bkt/x").unwrap();
    assert_eq!(path.kind(), PathKind::host_local());
}
