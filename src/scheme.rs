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

//! Kinds of path, and the registry that chooses a kind for a raw string.
//!
//! Detection is purely syntactic: each registered kind trial-parses the
//! arguments, most recently registered first, and the first that yields a
//! non-empty drive wins. Anything left over is a local path for the host OS.
//!
//! There are two process-wide registries: one for [crate::PurePath], which
//! knows every built-in scheme, and one for [crate::Path], in which schemes
//! whose client is not compiled into this build are marked as having a
//! missing dependency and never match.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use lazy_static::lazy_static;
use tracing::trace;

use crate::errors::Result;
use crate::flavour::{self, Flavour, Parsed};

/// An object store family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Store {
    /// AWS S3 or a compatible store, `s3://bucket/key`.
    S3,
    /// Google Cloud Storage, `gs://bucket/key`.
    Gcs,
    /// An application-defined store; its client must be registered with
    /// [crate::clients::register_client] before use.
    Custom(&'static Flavour),
}

impl Store {
    pub fn flavour(self) -> &'static Flavour {
        match self {
            Store::S3 => &flavour::S3,
            Store::Gcs => &flavour::GCS,
            Store::Custom(flavour) => flavour,
        }
    }

    /// True if this build can construct a default client for the store.
    pub fn is_available(self) -> bool {
        match self {
            Store::S3 => cfg!(feature = "s3"),
            Store::Gcs => cfg!(feature = "gcs"),
            Store::Custom(_) => true,
        }
    }
}

/// Style of local path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocalStyle {
    Posix,
    Windows,
}

/// The concrete kind of a path, which fixes its flavour and capabilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathKind {
    Local(LocalStyle),
    Http,
    ObjectStore(Store),
    /// Any URI, supporting only pure path manipulation.
    Uri,
}

impl PathKind {
    pub const POSIX: PathKind = PathKind::Local(LocalStyle::Posix);
    pub const WINDOWS: PathKind = PathKind::Local(LocalStyle::Windows);
    pub const S3: PathKind = PathKind::ObjectStore(Store::S3);
    pub const GCS: PathKind = PathKind::ObjectStore(Store::Gcs);

    /// The local kind for the OS we're running on.
    pub fn host_local() -> PathKind {
        if cfg!(windows) {
            PathKind::WINDOWS
        } else {
            PathKind::POSIX
        }
    }

    pub fn flavour(self) -> &'static Flavour {
        match self {
            PathKind::Local(LocalStyle::Posix) => &flavour::POSIX,
            PathKind::Local(LocalStyle::Windows) => &flavour::WINDOWS,
            PathKind::Http => &flavour::HTTP,
            PathKind::ObjectStore(store) => store.flavour(),
            PathKind::Uri => &flavour::URI,
        }
    }

    pub fn name(self) -> &'static str {
        self.flavour().name()
    }

    pub fn is_local(self) -> bool {
        matches!(self, PathKind::Local(_))
    }

    /// The store, if this is an object store path.
    pub fn store(self) -> Option<Store> {
        match self {
            PathKind::ObjectStore(store) => Some(store),
            _ => None,
        }
    }

    /// True if filesystem operations on this kind are compiled into this build.
    ///
    /// Local paths on the other OS family still parse, but can't be operated on.
    pub fn has_capability(self) -> bool {
        match self {
            PathKind::Local(_) => self == PathKind::host_local(),
            PathKind::Http => cfg!(feature = "http"),
            PathKind::ObjectStore(store) => store.is_available(),
            PathKind::Uri => false,
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One registered kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    /// The client for this kind could not be loaded: it still parses as a
    /// pure path, but is skipped when dispatching.
    pub missing_dependency: bool,
    pub kind: PathKind,
}

/// An ordered list of kinds, consulted most-recent first.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    /// An empty registry, in which everything is a local path.
    pub fn new() -> Registry {
        Registry::default()
    }

    /// All the built-in schemes, for pure paths.
    pub fn pure_default() -> Registry {
        let mut registry = Registry::new();
        for kind in [PathKind::Uri, PathKind::Http, PathKind::S3, PathKind::GCS] {
            registry.register(kind, false);
        }
        registry
    }

    /// Schemes for paths with filesystem operations, marking those not built in.
    pub fn path_default() -> Registry {
        let mut registry = Registry::new();
        for kind in [PathKind::Http, PathKind::S3, PathKind::GCS] {
            registry.register(kind, !kind.has_capability());
        }
        registry
    }

    /// Add a kind, taking precedence over everything registered before.
    pub fn register(&mut self, kind: PathKind, missing_dependency: bool) {
        self.entries.push(Entry {
            missing_dependency,
            kind,
        });
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Choose a kind for these arguments and parse them.
    ///
    /// This never fails on unrecognized schemes: they fall through to the
    /// host's local flavour.
    pub fn dispatch<S: AsRef<str>>(&self, args: &[S]) -> Result<(PathKind, Parsed)> {
        for entry in self.entries.iter().rev() {
            if entry.missing_dependency {
                continue;
            }
            match entry.kind.flavour().parse_parts(args) {
                Ok(parsed) if !parsed.drive.is_empty() => {
                    trace!(kind = %entry.kind, drive = %parsed.drive, "dispatched");
                    return Ok((entry.kind, parsed));
                }
                Ok(_) => (),
                Err(err) => trace!(kind = %entry.kind, %err, "not this kind"),
            }
        }
        let kind = PathKind::host_local();
        Ok((kind, kind.flavour().parse_parts(args)?))
    }
}

lazy_static! {
    static ref PURE_REGISTRY: RwLock<Registry> = RwLock::new(Registry::pure_default());
    static ref PATH_REGISTRY: RwLock<Registry> = RwLock::new(Registry::path_default());
}

/// Register a kind for [crate::PurePath::new] to detect.
pub fn register_pure_kind(kind: PathKind, missing_dependency: bool) {
    PURE_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(kind, missing_dependency);
}

/// Register a kind for [crate::Path::new] to detect.
pub fn register_path_kind(kind: PathKind, missing_dependency: bool) {
    PATH_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(kind, missing_dependency);
}

pub(crate) fn dispatch_pure<S: AsRef<str>>(args: &[S]) -> Result<(PathKind, Parsed)> {
    PURE_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .dispatch(args)
}

pub(crate) fn dispatch_path<S: AsRef<str>>(args: &[S]) -> Result<(PathKind, Parsed)> {
    PATH_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .dispatch(args)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    static MEM: Flavour = Flavour::object_store("mem", &["mem"]);

    fn kind_of(registry: &Registry, s: &str) -> PathKind {
        registry.dispatch(&[s]).unwrap().0
    }

    #[test]
    fn pure_default_detects_builtin_schemes() {
        let registry = Registry::pure_default();
        assert_eq!(kind_of(&registry, "s3://bkt/a"), PathKind::S3);
        assert_eq!(kind_of(&registry, "gs://bkt/a"), PathKind::GCS);
        assert_eq!(kind_of(&registry, "https://example.com"), PathKind::Http);
        assert_eq!(kind_of(&registry, "ftp://example.com/x"), PathKind::Uri);
        assert_eq!(kind_of(&registry, "/local/path"), PathKind::host_local());
        assert_eq!(kind_of(&registry, "relative"), PathKind::host_local());
    }

    #[test]
    fn drive_letters_are_not_schemes() {
        let registry = Registry::pure_default();
        assert_eq!(kind_of(&registry, r"C:\local\path"), PathKind::host_local());
    }

    #[test]
    fn empty_registry_is_all_local() {
        let registry = Registry::new();
        assert_eq!(kind_of(&registry, "s3://bkt/a"), PathKind::host_local());
    }

    #[test]
    fn later_registration_shadows_earlier() {
        let mut registry = Registry::pure_default();
        assert_eq!(kind_of(&registry, "mem://bkt/a"), PathKind::Uri);
        registry.register(PathKind::ObjectStore(Store::Custom(&MEM)), false);
        assert_eq!(
            kind_of(&registry, "mem://bkt/a"),
            PathKind::ObjectStore(Store::Custom(&MEM))
        );
        registry.register(PathKind::Uri, false);
        assert_eq!(kind_of(&registry, "mem://bkt/a"), PathKind::Uri);
        assert_eq!(kind_of(&registry, "s3://bkt/a"), PathKind::Uri);
    }

    #[test]
    fn missing_dependency_is_skipped() {
        let mut registry = Registry::new();
        registry.register(PathKind::GCS, true);
        assert_eq!(kind_of(&registry, "gs://bkt/a"), PathKind::host_local());
    }

    #[test]
    fn later_absolute_argument_selects_kind() {
        let registry = Registry::pure_default();
        let (kind, parsed) = registry.dispatch(&["a", "s3://bkt/k"]).unwrap();
        assert_eq!(kind, PathKind::S3);
        assert_eq!(parsed.segments, ["k"]);
    }
}
