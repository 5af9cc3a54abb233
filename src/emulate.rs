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

//! Filesystem-like directories on top of a flat object store.
//!
//! A directory is a zero-byte marker object whose key ends in `/`; the
//! bucket root always exists and is always a directory. Every operation is
//! expressed only in terms of [Backend] calls, and none of them retry.
//!
//! Checks and mutations are not atomic: a concurrent writer can change the
//! store between the existence check and the write. Creation uses
//! [WriteMode::CreateNew] where it matters, so that a lost race is reported
//! as [ErrorKind::AlreadyExists].

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, instrument, trace, warn};

use crate::backend::{Backend, WriteMode};
use crate::blob::{to_dir_key, to_file_key};
use crate::errors::{Error, ErrorKind, Result};
use crate::pure_path::PurePath;

/// The bucket of a path, which must have one.
fn bucket(path: &PurePath) -> Result<&str> {
    match path.bucket() {
        "" => Err(Error::invalid_argument(path, "object store path has no bucket")),
        bucket => Ok(bucket),
    }
}

/// True if an object exists at exactly this key; the bucket root always exists.
fn key_exists(backend: &dyn Backend, bucket: &str, key: &str) -> Result<bool> {
    if key.is_empty() || key == "/" {
        return Ok(true);
    }
    Ok(backend.head(bucket, key)?.is_some())
}

/// Fail with `NotFound` unless the parent directory marker exists.
fn check_parent(backend: &dyn Backend, path: &PurePath) -> Result<()> {
    let bucket = bucket(path)?;
    if key_exists(backend, bucket, &to_dir_key(&path.parent().key()))? {
        Ok(())
    } else {
        debug!(%path, "parent directory does not exist");
        Err(Error::new(ErrorKind::NotFound, path.parent()).with_source("parent directory does not exist"))
    }
}

/// True if either a file or a directory marker exists.
#[instrument(skip(backend))]
pub fn exists(backend: &dyn Backend, path: &PurePath) -> Result<bool> {
    let bucket = bucket(path)?;
    let key = path.key();
    Ok(key_exists(backend, bucket, to_file_key(&key))?
        || key_exists(backend, bucket, &to_dir_key(&key))?)
}

/// True if a zero-byte directory marker exists.
///
/// A non-empty object at a marker key is not a directory.
#[instrument(skip(backend))]
pub fn is_dir(backend: &dyn Backend, path: &PurePath) -> Result<bool> {
    let bucket = bucket(path)?;
    let key = path.key();
    if key.is_empty() {
        return Ok(true);
    }
    Ok(backend
        .head(bucket, &to_dir_key(&key))?
        .is_some_and(|meta| meta.len == 0))
}

/// True if a file object exists.
#[instrument(skip(backend))]
pub fn is_file(backend: &dyn Backend, path: &PurePath) -> Result<bool> {
    let bucket = bucket(path)?;
    let key = path.key();
    if key.is_empty() {
        return Ok(false);
    }
    Ok(backend.head(bucket, to_file_key(&key))?.is_some())
}

/// List the immediate children of a directory, one page at a time.
pub fn iterdir(backend: Arc<dyn Backend>, path: &PurePath) -> Result<ListDir> {
    let bucket = bucket(path)?.to_owned();
    let key = path.key();
    let prefix = if key.is_empty() {
        key
    } else {
        to_dir_key(&key)
    };
    debug!(%path, %prefix, "iterdir");
    Ok(ListDir {
        backend,
        bucket,
        prefix,
        base: path.clone(),
        token: None,
        names: VecDeque::new(),
        done: false,
    })
}

/// Iterator over the children of an object store directory.
///
/// Each page is fetched when the previous one is exhausted. Files and
/// subdirectories are returned in the order the store lists them, files of
/// each page first.
#[derive(Debug)]
pub struct ListDir {
    backend: Arc<dyn Backend>,
    bucket: String,
    prefix: String,
    base: PurePath,
    token: Option<String>,
    /// Child names from the current page, not yet returned.
    names: VecDeque<String>,
    done: bool,
}

impl ListDir {
    fn fetch_page(&mut self) -> Result<()> {
        let page = self.backend.list(
            &self.bucket,
            &self.prefix,
            Some("/"),
            self.token.as_deref(),
        )?;
        for key in page
            .objects
            .into_iter()
            .map(|o| o.key)
            .chain(page.common_prefixes)
        {
            let Some(name) = key.strip_prefix(&self.prefix) else {
                warn!(%key, prefix = %self.prefix, "listed key outside prefix");
                continue;
            };
            let name = name.trim_end_matches('/');
            if matches!(name, "" | "." | "..") || name.contains('/') {
                trace!(%key, "skip");
                continue;
            }
            self.names.push_back(name.to_owned());
        }
        self.token = page.next_token;
        self.done = self.token.is_none();
        Ok(())
    }
}

impl Iterator for ListDir {
    type Item = Result<PurePath>;

    fn next(&mut self) -> Option<Result<PurePath>> {
        loop {
            if let Some(name) = self.names.pop_front() {
                return Some(Ok(self.base.child(&name)));
            }
            if self.done {
                return None;
            }
            if let Err(err) = self.fetch_page() {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}

/// Create one directory, whose parent must already exist.
#[instrument(skip(backend))]
pub fn mkdir_one(backend: &dyn Backend, path: &PurePath) -> Result<()> {
    check_parent(backend, path)?;
    if exists(backend, path)? {
        return Err(Error::new(ErrorKind::AlreadyExists, path));
    }
    backend.put(
        bucket(path)?,
        &to_dir_key(&path.key()),
        b"",
        WriteMode::CreateNew,
    )
}

/// Create a directory, optionally creating missing parents and tolerating
/// an existing directory.
///
/// With `exist_ok`, any failure to create the directory is forgiven if the
/// directory turns out to exist afterwards, for example because another
/// writer created it concurrently.
pub fn mkdir(backend: &dyn Backend, path: &PurePath, parents: bool, exist_ok: bool) -> Result<()> {
    match mkdir_one(backend, path) {
        Ok(()) => Ok(()),
        Err(err) if err.is_not_found() && parents => {
            let parent = path.parent();
            if parent == *path {
                return Err(err);
            }
            mkdir(backend, &parent, true, true)?;
            mkdir(backend, path, false, exist_ok)
        }
        Err(err) if exist_ok && !err.is_not_found() => {
            if is_dir(backend, path)? {
                trace!(%path, "directory already exists");
                Ok(())
            } else {
                Err(err)
            }
        }
        Err(err) => Err(err),
    }
}

/// Delete a directory marker and everything under it.
#[instrument(skip(backend))]
pub fn rmdir(backend: &dyn Backend, path: &PurePath) -> Result<()> {
    let bucket = bucket(path)?;
    let key = path.key();
    if key.is_empty() {
        return Err(Error::new(ErrorKind::PermissionDenied, path)
            .with_source("can't remove the bucket root"));
    }
    if key_exists(backend, bucket, to_file_key(&key))? {
        return Err(Error::new(ErrorKind::NotADirectory, path));
    }
    let prefix = to_dir_key(&key);
    let mut keys = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = backend.list(bucket, &prefix, None, token.as_deref())?;
        keys.extend(page.objects.into_iter().map(|o| o.key));
        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    if keys.is_empty() {
        return Err(Error::new(ErrorKind::NotFound, path));
    }
    debug!(%path, n_keys = keys.len(), "delete directory contents");
    backend.delete_batch(bucket, &keys)
}

/// Create an empty object, or refresh the modification time of an existing one.
#[instrument(skip(backend))]
pub fn touch(backend: &dyn Backend, path: &PurePath, exist_ok: bool) -> Result<()> {
    let bucket = bucket(path)?;
    let key = path.key();
    if key.is_empty() {
        return Err(Error::new(ErrorKind::PermissionDenied, path)
            .with_source("can't touch the bucket root"));
    }
    check_parent(backend, path)?;
    if exist_ok {
        match backend.copy(bucket, &key, &key) {
            Ok(()) => return Ok(()),
            Err(err) if err.is_not_found() => trace!("no existing object to refresh"),
            Err(err) => return Err(err),
        }
    } else if exists(backend, path)? {
        return Err(Error::new(ErrorKind::AlreadyExists, path));
    }
    let mode = if exist_ok {
        WriteMode::Overwrite
    } else {
        WriteMode::CreateNew
    };
    backend.put(bucket, &key, b"", mode)
}

/// Delete a file object.
///
/// Directories can't be unlinked; use [rmdir].
#[instrument(skip(backend))]
pub fn unlink(backend: &dyn Backend, path: &PurePath, missing_ok: bool) -> Result<()> {
    let bucket = bucket(path)?;
    let key = path.key();
    let file_key = to_file_key(&key);
    if !file_key.is_empty() && key_exists(backend, bucket, file_key)? {
        return backend.delete(bucket, file_key);
    }
    if key_exists(backend, bucket, &to_dir_key(&key))? {
        return Err(Error::new(ErrorKind::PermissionDenied, path).with_source("is a directory"));
    }
    if missing_ok {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::NotFound, path))
    }
}

/// Read the whole content of a file object.
pub fn read_bytes(backend: &dyn Backend, path: &PurePath) -> Result<Bytes> {
    let key = path.key();
    if key.is_empty() {
        return Err(Error::new(ErrorKind::PermissionDenied, path).with_source("is a directory"));
    }
    backend.get(bucket(path)?, &key)
}

/// Replace the whole content of a file object.
pub fn write_bytes(backend: &dyn Backend, path: &PurePath, content: &[u8]) -> Result<()> {
    let key = path.key();
    if key.is_empty() {
        return Err(Error::new(ErrorKind::PermissionDenied, path).with_source("is a directory"));
    }
    backend.put(bucket(path)?, &key, content, WriteMode::Overwrite)
}
