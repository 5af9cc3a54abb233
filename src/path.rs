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

//! Paths with filesystem operations.
//!
//! A [Path] is a [PurePath] plus the means to act on it: the local OS for
//! local paths, HTTP for `http(s)://` paths, and a [Backend] for object
//! store paths, with directories emulated by [crate::emulate].
//!
//! Operations that make no sense for a kind of path, like `chmod` on an
//! object, fail with [ErrorKind::Unsupported].

use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, Div};
use std::path::{Path as StdPath, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tracing::trace;

use crate::backend::Backend;
use crate::clients;
use crate::emulate;
use crate::errors::{Error, ErrorKind, Result};
use crate::local::{self, Special};
use crate::pure_path::PurePath;
use crate::scheme::{self, PathKind};

/// A path that can be used to access a filesystem or object store.
///
/// Derived paths (from [Path::join], [Path::parent], etc) keep any client
/// attached with [Path::with_client].
#[derive(Clone)]
pub struct Path {
    pure: PurePath,
    /// An explicitly attached client, overriding the process-wide one.
    client: Option<Arc<dyn Backend>>,
}

/// How to reach the thing a path names.
enum Access {
    Local(PathBuf),
    #[cfg(feature = "http")]
    Http,
    Store(Arc<dyn Backend>),
}

impl Path {
    /// Make a path from one or more strings, choosing its kind from the
    /// registered schemes.
    ///
    /// Schemes whose client is not built into this library are not
    /// recognized, and such strings become local paths.
    pub fn new<S: AsRef<str>>(args: &[S]) -> Result<Path> {
        let (kind, parsed) = scheme::dispatch_path(args)?;
        Ok(Path::from_pure(PurePath::from_parsed(kind, parsed)))
    }

    pub fn parse(s: &str) -> Result<Path> {
        Path::new(&[s])
    }

    /// Make a path of a specific kind.
    pub fn of_kind<S: AsRef<str>>(kind: PathKind, args: &[S]) -> Result<Path> {
        PurePath::of_kind(kind, args).map(Path::from_pure)
    }

    /// Add operations to a pure path.
    pub fn from_pure(pure: PurePath) -> Path {
        Path { pure, client: None }
    }

    /// Make a local path from an OS path.
    pub fn from_local(path: &StdPath) -> Result<Path> {
        Path::of_kind(PathKind::host_local(), &[path.to_string_lossy()])
    }

    /// The current user's home directory.
    pub fn home() -> Result<Path> {
        Path::from_local(&local::home()?)
    }

    /// Use a specific backend client for this path and everything derived
    /// from it.
    #[must_use]
    pub fn with_client(self, client: Arc<dyn Backend>) -> Path {
        Path {
            client: Some(client),
            ..self
        }
    }

    /// A sibling path sharing this path's client.
    fn derive(&self, pure: PurePath) -> Path {
        Path {
            pure,
            client: self.client.clone(),
        }
    }

    pub fn as_pure(&self) -> &PurePath {
        &self.pure
    }

    pub fn into_pure(self) -> PurePath {
        self.pure
    }

    fn unsupported(&self, operation: &str) -> Error {
        Error::unsupported(&self.pure, operation)
    }

    fn access(&self, operation: &str) -> Result<Access> {
        match self.pure.kind() {
            kind @ PathKind::Local(_) if kind == PathKind::host_local() => {
                Ok(Access::Local(PathBuf::from(self.pure.as_str())))
            }
            #[cfg(feature = "http")]
            PathKind::Http => Ok(Access::Http),
            PathKind::ObjectStore(store) => match &self.client {
                Some(client) => Ok(Access::Store(Arc::clone(client))),
                None => clients::client(store)
                    .map(Access::Store)
                    .map_err(|err| self.unsupported(operation).with_source(err)),
            },
            _ => Err(self.unsupported(operation)),
        }
    }

    /// The OS path, for operations only local paths support.
    fn local_only(&self, operation: &str) -> Result<PathBuf> {
        match self.access(operation)? {
            Access::Local(path) => Ok(path),
            _ => Err(self.unsupported(operation)),
        }
    }

    /// Either the OS path or the object store client, for filesystem-like
    /// operations.
    fn fs_access(&self, operation: &str) -> Result<Access> {
        match self.access(operation)? {
            #[cfg(feature = "http")]
            Access::Http => Err(self.unsupported(operation)),
            access => Ok(access),
        }
    }

    pub fn join<S: AsRef<str>>(&self, args: &[S]) -> Result<Path> {
        Ok(self.derive(self.pure.join(args)?))
    }

    pub fn parent(&self) -> Path {
        self.derive(self.pure.parent())
    }

    /// All the ancestors of this path, nearest first.
    pub fn parents(&self) -> impl DoubleEndedIterator<Item = Path> + ExactSizeIterator + '_ {
        self.pure.parents().map(|p| self.derive(p))
    }

    pub fn with_name(&self, name: &str) -> Result<Path> {
        Ok(self.derive(self.pure.with_name(name)?))
    }

    pub fn with_stem(&self, stem: &str) -> Result<Path> {
        Ok(self.derive(self.pure.with_stem(stem)?))
    }

    pub fn with_suffix(&self, suffix: &str) -> Result<Path> {
        Ok(self.derive(self.pure.with_suffix(suffix)?))
    }

    pub fn relative_to(&self, other: &str) -> Result<Path> {
        Ok(self.derive(self.pure.relative_to(other)?))
    }

    /// Make the path absolute and remove `..`.
    ///
    /// Local paths are resolved by the OS, following symlinks, if they exist;
    /// everything else is normalized lexically.
    pub fn resolve(&self) -> Result<Path> {
        match self.pure.kind() {
            kind if kind == PathKind::host_local() => {
                Path::from_local(&local::resolve(&self.local_only("resolve")?)?)
            }
            _ => Ok(self.derive(self.pure.resolve())),
        }
    }

    pub fn exists(&self) -> Result<bool> {
        match self.fs_access("exists")? {
            Access::Local(path) => local::exists(&path),
            Access::Store(backend) => emulate::exists(backend.as_ref(), &self.pure),
            #[allow(unreachable_patterns)]
            _ => Err(self.unsupported("exists")),
        }
    }

    pub fn is_dir(&self) -> Result<bool> {
        match self.fs_access("is_dir")? {
            Access::Local(path) => Ok(local::is_dir(&path)),
            Access::Store(backend) => emulate::is_dir(backend.as_ref(), &self.pure),
            #[allow(unreachable_patterns)]
            _ => Err(self.unsupported("is_dir")),
        }
    }

    pub fn is_file(&self) -> Result<bool> {
        match self.fs_access("is_file")? {
            Access::Local(path) => Ok(local::is_file(&path)),
            Access::Store(backend) => emulate::is_file(backend.as_ref(), &self.pure),
            #[allow(unreachable_patterns)]
            _ => Err(self.unsupported("is_file")),
        }
    }

    /// The immediate children of this directory.
    ///
    /// For object stores, pages of the listing are fetched as the iterator
    /// advances.
    pub fn iterdir(&self) -> Result<Box<dyn Iterator<Item = Result<Path>>>> {
        match self.fs_access("iterdir")? {
            Access::Local(path) => {
                let base = self.clone();
                Ok(Box::new(local::list_dir(&path)?.map(move |name| {
                    name.map(|name| base.derive(base.pure.child(&name)))
                })))
            }
            Access::Store(backend) => {
                let client = self.client.clone();
                Ok(Box::new(emulate::iterdir(backend, &self.pure)?.map(
                    move |child| {
                        child.map(|pure| Path {
                            pure,
                            client: client.clone(),
                        })
                    },
                )))
            }
            #[allow(unreachable_patterns)]
            _ => Err(self.unsupported("iterdir")),
        }
    }

    /// Create this directory.
    ///
    /// With `parents`, missing ancestors are created first. With `exist_ok`,
    /// an existing directory is not an error.
    pub fn mkdir(&self, parents: bool, exist_ok: bool) -> Result<()> {
        match self.fs_access("mkdir")? {
            Access::Local(path) => local::mkdir(&path, parents, exist_ok),
            Access::Store(backend) => emulate::mkdir(backend.as_ref(), &self.pure, parents, exist_ok),
            #[allow(unreachable_patterns)]
            _ => Err(self.unsupported("mkdir")),
        }
    }

    /// Remove this directory.
    ///
    /// Local directories must be empty. An object store directory is removed
    /// along with everything under it.
    pub fn rmdir(&self) -> Result<()> {
        match self.fs_access("rmdir")? {
            Access::Local(path) => local::rmdir(&path),
            Access::Store(backend) => emulate::rmdir(backend.as_ref(), &self.pure),
            #[allow(unreachable_patterns)]
            _ => Err(self.unsupported("rmdir")),
        }
    }

    /// Create an empty file, or with `exist_ok`, update the modification
    /// time of an existing one.
    pub fn touch(&self, exist_ok: bool) -> Result<()> {
        match self.fs_access("touch")? {
            Access::Local(path) => local::touch(&path, exist_ok),
            Access::Store(backend) => emulate::touch(backend.as_ref(), &self.pure, exist_ok),
            #[allow(unreachable_patterns)]
            _ => Err(self.unsupported("touch")),
        }
    }

    /// Delete this file.
    pub fn unlink(&self, missing_ok: bool) -> Result<()> {
        match self.fs_access("unlink")? {
            Access::Local(path) => local::unlink(&path, missing_ok),
            Access::Store(backend) => emulate::unlink(backend.as_ref(), &self.pure, missing_ok),
            #[allow(unreachable_patterns)]
            _ => Err(self.unsupported("unlink")),
        }
    }

    /// Read the whole content of the file.
    pub fn read_bytes(&self) -> Result<Bytes> {
        match self.access("read_bytes")? {
            Access::Local(path) => local::read_bytes(&path),
            #[cfg(feature = "http")]
            Access::Http => crate::http::read_bytes(self.pure.as_str()),
            Access::Store(backend) => emulate::read_bytes(backend.as_ref(), &self.pure),
        }
    }

    /// Read the whole content of the file, which must be UTF-8.
    pub fn read_text(&self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.into()).map_err(|err| {
            Error::new(ErrorKind::InvalidArgument, &self.pure).with_source(err)
        })
    }

    /// Replace the whole content of the file.
    pub fn write_bytes(&self, content: &[u8]) -> Result<()> {
        match self.fs_access("write_bytes")? {
            Access::Local(path) => local::write_bytes(&path, content),
            Access::Store(backend) => emulate::write_bytes(backend.as_ref(), &self.pure, content),
            #[allow(unreachable_patterns)]
            _ => Err(self.unsupported("write_bytes")),
        }
    }

    pub fn write_text(&self, text: &str) -> Result<()> {
        self.write_bytes(text.as_bytes())
    }

    pub fn stat(&self) -> Result<fs::Metadata> {
        local::stat(&self.local_only("stat")?)
    }

    pub fn lstat(&self) -> Result<fs::Metadata> {
        local::lstat(&self.local_only("lstat")?)
    }

    /// Set the permission bits of a local file; unsupported on Windows.
    pub fn chmod(&self, mode: u32) -> Result<()> {
        local::chmod(&self.local_only("chmod")?, mode)
    }

    /// Not available on any kind of path.
    pub fn lchmod(&self, _mode: u32) -> Result<()> {
        Err(self.unsupported("lchmod"))
    }

    /// Not available on any kind of path: user names are not looked up.
    pub fn owner(&self) -> Result<String> {
        Err(self.unsupported("owner"))
    }

    /// Not available on any kind of path: group names are not looked up.
    pub fn group(&self) -> Result<String> {
        Err(self.unsupported("group"))
    }

    pub fn is_symlink(&self) -> Result<bool> {
        Ok(local::is_symlink(&self.local_only("is_symlink")?))
    }

    pub fn is_mount(&self) -> Result<bool> {
        local::is_mount(&self.local_only("is_mount")?)
    }

    pub fn is_block_device(&self) -> Result<bool> {
        self.is_special("is_block_device", Special::BlockDevice)
    }

    pub fn is_char_device(&self) -> Result<bool> {
        self.is_special("is_char_device", Special::CharDevice)
    }

    pub fn is_fifo(&self) -> Result<bool> {
        self.is_special("is_fifo", Special::Fifo)
    }

    pub fn is_socket(&self) -> Result<bool> {
        self.is_special("is_socket", Special::Socket)
    }

    fn is_special(&self, operation: &str, special: Special) -> Result<bool> {
        Ok(local::is_special(&self.local_only(operation)?, special))
    }

    pub fn readlink(&self) -> Result<Path> {
        Path::from_local(&local::readlink(&self.local_only("readlink")?)?)
    }

    /// Make this path a symlink pointing to `target`.
    pub fn symlink_to(&self, target: &str) -> Result<()> {
        local::symlink_to(&self.local_only("symlink_to")?, StdPath::new(target))
    }

    /// Make this path a hard link to `target`.
    pub fn hardlink_to(&self, target: &str) -> Result<()> {
        local::hardlink_to(&self.local_only("hardlink_to")?, StdPath::new(target))
    }

    /// Rename this file or directory, returning the new path.
    pub fn rename(&self, target: &str) -> Result<Path> {
        let from = self.local_only("rename")?;
        local::rename(&from, StdPath::new(target))?;
        Path::from_local(StdPath::new(target))
    }

    /// Rename, replacing any existing file at the target.
    pub fn replace(&self, target: &str) -> Result<Path> {
        let from = self.local_only("replace")?;
        local::rename(&from, StdPath::new(target))?;
        Path::from_local(StdPath::new(target))
    }

    pub fn samefile(&self, other: &Path) -> Result<bool> {
        let a = self.local_only("samefile")?;
        let b = other.local_only("samefile")?;
        local::samefile(&a, &b)
    }

    /// Make the path absolute without normalizing it.
    pub fn absolute(&self) -> Result<Path> {
        Path::from_local(&local::absolute(&self.local_only("absolute")?)?)
    }

    pub fn expanduser(&self) -> Result<Path> {
        Path::from_local(&local::expanduser(&self.local_only("expanduser")?)?)
    }

    /// Find entries below this directory matching a relative pattern.
    ///
    /// A `**` segment matches this directory and every directory below it.
    pub fn glob(&self, pattern: &str) -> Result<Vec<Path>> {
        let base = self.local_only("glob")?;
        let flavour = self.pure.flavour();
        let parsed = flavour.parse_parts(&[pattern])?;
        if !parsed.drive.is_empty() || !parsed.root.is_empty() {
            return Err(Error::invalid_argument(pattern, "non-relative patterns are unsupported"));
        }
        if parsed.segments.is_empty() {
            return Err(Error::invalid_argument(pattern, "empty pattern"));
        }
        let matchers = parsed
            .segments
            .iter()
            .map(|segment| match segment.as_str() {
                "**" => Ok(None),
                _ => flavour.compile_pattern(segment).map(Some),
            })
            .collect::<Result<Vec<_>>>()?;
        let found = local::glob(&base, &matchers)?;
        trace!(%pattern, n_found = found.len(), "glob");
        found.iter().map(|p| Path::from_local(p)).collect()
    }

    /// Like [Path::glob], with `**/` added in front of the pattern.
    pub fn rglob(&self, pattern: &str) -> Result<Vec<Path>> {
        self.local_only("rglob")?;
        self.glob(&format!("**/{pattern}"))
    }
}

impl Deref for Path {
    type Target = PurePath;

    fn deref(&self) -> &PurePath {
        &self.pure
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        self.pure.as_str()
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.pure == other.pure
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pure.hash(state)
    }
}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.pure.partial_cmp(&other.pure)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.pure, f)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({}, {:?})", self.pure.kind(), self.pure.as_str())
    }
}

impl<S: AsRef<str>> Div<S> for &Path {
    type Output = Result<Path>;

    fn div(self, rhs: S) -> Result<Path> {
        self.join(&[rhs])
    }
}

impl From<PurePath> for Path {
    fn from(pure: PurePath) -> Path {
        Path::from_pure(pure)
    }
}
