// Copyright 2020-2025 Martin Pool.

// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

//! Operations on local paths, passed through to the OS.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use filetime::FileTime;
use globset::GlobMatcher;
use tracing::{instrument, trace, warn};

use crate::errors::{Error, ErrorKind, Result};

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |err| Error::io_error(path, err)
}

/// True if the path exists, following symlinks.
pub(crate) fn exists(path: &Path) -> Result<bool> {
    path.try_exists().map_err(io_error(path))
}

pub(crate) fn is_dir(path: &Path) -> bool {
    path.is_dir()
}

pub(crate) fn is_file(path: &Path) -> bool {
    path.is_file()
}

pub(crate) fn is_symlink(path: &Path) -> bool {
    path.is_symlink()
}

/// Names of the entries in a directory, in arbitrary order.
///
/// Names that are not valid UTF-8 are skipped with a warning.
pub(crate) fn list_dir(path: &Path) -> Result<impl Iterator<Item = Result<String>>> {
    let read_dir = path.read_dir().map_err(io_error(path))?;
    let path = path.to_owned();
    Ok(read_dir.filter_map(move |entry| match entry {
        Ok(entry) => match entry.file_name().into_string() {
            Ok(name) => Some(Ok(name)),
            Err(name) => {
                warn!("Non-UTF-8 filename {name:?} in {path:?}");
                None
            }
        },
        Err(err) => Some(Err(Error::io_error(&path, err))),
    }))
}

/// Create a directory, with the same `parents` and `exist_ok` rules as
/// object store directories.
#[instrument]
pub(crate) fn mkdir(path: &Path, parents: bool, exist_ok: bool) -> Result<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound && parents => {
            match path.parent() {
                Some(parent) if parent != path && !parent.as_os_str().is_empty() => {
                    mkdir(parent, true, true)?;
                    mkdir(path, false, exist_ok)
                }
                _ => Err(Error::io_error(path, err)),
            }
        }
        Err(err) if exist_ok && err.kind() != io::ErrorKind::NotFound && path.is_dir() => {
            trace!("directory already exists");
            Ok(())
        }
        Err(err) => Err(Error::io_error(path, err)),
    }
}

pub(crate) fn rmdir(path: &Path) -> Result<()> {
    fs::remove_dir(path).map_err(io_error(path))
}

/// Create an empty file, or update the mtime of an existing one.
#[instrument]
pub(crate) fn touch(path: &Path, exist_ok: bool) -> Result<()> {
    if exist_ok {
        match filetime::set_file_mtime(path, FileTime::now()) {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => (),
            Err(err) => return Err(Error::io_error(path, err)),
        }
    }
    OpenOptions::new()
        .write(true)
        .create(exist_ok)
        .create_new(!exist_ok)
        .truncate(false)
        .open(path)
        .map(drop)
        .map_err(io_error(path))
}

pub(crate) fn unlink(path: &Path, missing_ok: bool) -> Result<()> {
    match fs::remove_file(path) {
        Err(err) if missing_ok && err.kind() == io::ErrorKind::NotFound => Ok(()),
        r => r.map_err(io_error(path)),
    }
}

pub(crate) fn read_bytes(path: &Path) -> Result<Bytes> {
    fs::read(path).map(Bytes::from).map_err(io_error(path))
}

pub(crate) fn write_bytes(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content).map_err(io_error(path))
}

pub(crate) fn stat(path: &Path) -> Result<fs::Metadata> {
    fs::metadata(path).map_err(io_error(path))
}

pub(crate) fn lstat(path: &Path) -> Result<fs::Metadata> {
    fs::symlink_metadata(path).map_err(io_error(path))
}

pub(crate) fn readlink(path: &Path) -> Result<PathBuf> {
    fs::read_link(path).map_err(io_error(path))
}

pub(crate) fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(io_error(from))
}

pub(crate) fn hardlink_to(path: &Path, target: &Path) -> Result<()> {
    fs::hard_link(target, path).map_err(io_error(path))
}

#[cfg(unix)]
pub(crate) fn symlink_to(path: &Path, target: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, path).map_err(io_error(path))
}

#[cfg(windows)]
pub(crate) fn symlink_to(path: &Path, target: &Path) -> Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, path)
    } else {
        std::os::windows::fs::symlink_file(target, path)
    }
    .map_err(io_error(path))
}

#[cfg(unix)]
pub(crate) fn chmod(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(io_error(path))
}

#[cfg(not(unix))]
pub(crate) fn chmod(path: &Path, _mode: u32) -> Result<()> {
    Err(Error::unsupported(path.display(), "chmod"))
}

/// True if both paths name the same file.
#[cfg(unix)]
pub(crate) fn samefile(a: &Path, b: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;
    let (ma, mb) = (stat(a)?, stat(b)?);
    Ok(ma.dev() == mb.dev() && ma.ino() == mb.ino())
}

#[cfg(not(unix))]
pub(crate) fn samefile(a: &Path, b: &Path) -> Result<bool> {
    Ok(fs::canonicalize(a).map_err(io_error(a))? == fs::canonicalize(b).map_err(io_error(b))?)
}

/// True if the path is a mount point: its parent is on a different device,
/// or it is the root.
#[cfg(unix)]
pub(crate) fn is_mount(path: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;
    let Ok(meta) = lstat(path) else {
        return Ok(false);
    };
    if meta.file_type().is_symlink() {
        return Ok(false);
    }
    let parent = lstat(&path.join(".."))?;
    Ok(meta.dev() != parent.dev() || meta.ino() == parent.ino())
}

#[cfg(not(unix))]
pub(crate) fn is_mount(path: &Path) -> Result<bool> {
    Err(Error::unsupported(path.display(), "is_mount"))
}

/// Special file types; these are never true except on Unix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Special {
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
}

pub(crate) fn is_special(path: &Path, special: Special) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        let Ok(meta) = fs::metadata(path) else {
            return false;
        };
        let ft = meta.file_type();
        match special {
            Special::BlockDevice => ft.is_block_device(),
            Special::CharDevice => ft.is_char_device(),
            Special::Fifo => ft.is_fifo(),
            Special::Socket => ft.is_socket(),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = (path, special);
        false
    }
}

/// Make a path absolute without resolving symlinks or `..`.
pub(crate) fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(io_error(path))
}

/// Canonicalize an existing path; for a missing one, make it absolute and
/// normalize it lexically.
pub(crate) fn resolve(path: &Path) -> Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut out = PathBuf::new();
            for component in absolute(path)?.components() {
                match component {
                    Component::ParentDir => {
                        out.pop();
                    }
                    Component::CurDir => (),
                    c => out.push(c),
                }
            }
            Ok(out)
        }
        Err(err) => Err(Error::io_error(path, err)),
    }
}

/// The current user's home directory, from the environment.
pub(crate) fn home() -> Result<PathBuf> {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(var)
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| {
            Error::new(ErrorKind::NotFound, "~").with_source(format!("{var} is not set"))
        })
}

/// Replace a leading `~` with the home directory.
pub(crate) fn expanduser(path: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => Ok(home()?.join(components.as_path())),
        Some(Component::Normal(first)) if first.to_string_lossy().starts_with('~') => Err(
            Error::new(ErrorKind::Unsupported, path.display())
                .with_source("expanding another user's home directory is not supported"),
        ),
        _ => Ok(path.to_owned()),
    }
}

/// Find entries below `dir` matching a sequence of segment patterns.
///
/// A `**` segment matches `dir` itself and every directory below it.
pub(crate) fn glob(dir: &Path, patterns: &[Option<GlobMatcher>]) -> Result<Vec<PathBuf>> {
    let mut current = vec![dir.to_owned()];
    for pattern in patterns {
        let mut next = Vec::new();
        for base in &current {
            match pattern {
                None => walk_dirs(base, &mut next)?,
                Some(matcher) => {
                    if !base.is_dir() {
                        continue;
                    }
                    for name in list_dir(base)? {
                        let name = name?;
                        if matcher.is_match(&name) {
                            next.push(base.join(name));
                        }
                    }
                }
            }
        }
        next.sort();
        next.dedup();
        current = next;
    }
    Ok(current)
}

/// Push `dir` and all directories below it, not following symlinks.
fn walk_dirs(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    out.push(dir.to_owned());
    for name in list_dir(dir)? {
        let child = dir.join(name?);
        if !child.is_symlink() && child.is_dir() {
            walk_dirs(&child, out)?;
        }
    }
    Ok(())
}
