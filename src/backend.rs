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

//! Bucket and key oriented access to object stores.
//!
//! A [Backend] is the narrow interface that the directory emulation in
//! [crate::emulate] runs against: head, get, put, copy, delete, and paged
//! listing. Each object store family has an adapter translating these into
//! its native API, and [memory::MemoryBackend] implements them in process
//! for tests.
//!
//! All calls block the calling thread until they complete. Adapters may
//! retry internally, but only report the final outcome.

use std::fmt;

use bytes::Bytes;
use time::OffsetDateTime;

use crate::errors::Result;

pub mod memory;
pub mod record;

#[cfg(feature = "gcs")]
pub mod gcs;
#[cfg(feature = "s3")]
pub mod s3;

/// Access to objects in buckets of one object store.
///
/// Backends are shared between threads and paths, so they must be `Send` and
/// `Sync`; any connection state is internal.
pub trait Backend: fmt::Debug + Send + Sync {
    /// Return metadata for an object, or `None` if it does not exist.
    ///
    /// A missing object is never reported as an error.
    fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>>;

    /// Read the whole content of an object.
    fn get(&self, bucket: &str, key: &str) -> Result<Bytes>;

    /// Write the whole content of an object.
    ///
    /// With [WriteMode::CreateNew], fails with
    /// [crate::ErrorKind::AlreadyExists] if the object already exists, as
    /// atomically as the store allows.
    fn put(&self, bucket: &str, key: &str, content: &[u8], mode: WriteMode) -> Result<()>;

    /// Copy an object within a bucket.
    ///
    /// Copying an object onto itself refreshes its modification time.
    fn copy(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<()>;

    /// Delete one object. Deleting an absent object is not an error.
    fn delete(&self, bucket: &str, key: &str) -> Result<()>;

    /// Delete many objects, in as few round trips as the store allows.
    fn delete_batch(&self, bucket: &str, keys: &[String]) -> Result<()> {
        for key in keys {
            self.delete(bucket, key)?;
        }
        Ok(())
    }

    /// Fetch one page of a listing.
    ///
    /// Returns objects whose keys start with `prefix`. If `delimiter` is
    /// given, keys with a further delimiter after the prefix are rolled up
    /// into common prefixes instead. Pass the previous page's
    /// [ListPage::next_token] to continue.
    fn list(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        token: Option<&str>,
    ) -> Result<ListPage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create the object if it does not exist, or overwrite it if it does.
    Overwrite,

    /// Create the object if it does not exist, or fail if it does.
    CreateNew,
}

/// Stat metadata about one object.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObjectMeta {
    /// Object length in bytes.
    pub len: u64,

    /// Last modified time.
    pub modified: OffsetDateTime,
}

/// An object returned from a listing.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct ObjectSummary {
    /// Full key within the bucket.
    pub key: String, // NB: Must be first for Ord
    pub len: u64,
}

/// One page of a listing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    /// Full prefixes, each ending in the delimiter.
    pub common_prefixes: Vec<String>,
    /// Token for the next page, or `None` if this is the last.
    pub next_token: Option<String>,
}
