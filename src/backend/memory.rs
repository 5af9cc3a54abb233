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

//! An object store held in memory, for tests and embedding.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use time::{Duration, OffsetDateTime};
use tracing::trace;

use super::{Backend, ListPage, ObjectMeta, ObjectSummary, WriteMode};
use crate::errors::{Error, ErrorKind, Result};

/// Default number of entries per listing page, matching S3.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug)]
struct Object {
    content: Bytes,
    modified: OffsetDateTime,
}

#[derive(Debug, Default)]
struct State {
    /// Objects by bucket and then key. Buckets spring into existence on first write.
    buckets: BTreeMap<String, BTreeMap<String, Object>>,
    /// The most recent modification time handed out.
    clock: Option<OffsetDateTime>,
}

impl State {
    /// A modification time strictly later than any before it.
    fn tick(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let t = match self.clock {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(t);
        t
    }

    fn object(&self, bucket: &str, key: &str) -> Option<&Object> {
        self.buckets.get(bucket).and_then(|b| b.get(key))
    }
}

/// An in-memory object store with S3-like listing semantics.
///
/// Listings are returned in key order, `page_size` entries at a time, so
/// that pagination can be exercised with small data.
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        MemoryBackend::new()
    }
}

impl MemoryBackend {
    pub fn new() -> MemoryBackend {
        MemoryBackend::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Make a backend returning at most `page_size` entries per listing page.
    pub fn with_page_size(page_size: usize) -> MemoryBackend {
        MemoryBackend {
            state: Mutex::default(),
            page_size: page_size.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All keys in a bucket, in order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn not_found(bucket: &str, key: &str) -> Error {
    Error::new(ErrorKind::NotFound, format!("{bucket}/{key}"))
}

impl Backend for MemoryBackend {
    fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>> {
        Ok(self.lock().object(bucket, key).map(|obj| ObjectMeta {
            len: obj.content.len() as u64,
            modified: obj.modified,
        }))
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        self.lock()
            .object(bucket, key)
            .map(|obj| obj.content.clone())
            .ok_or_else(|| not_found(bucket, key))
    }

    fn put(&self, bucket: &str, key: &str, content: &[u8], mode: WriteMode) -> Result<()> {
        let mut state = self.lock();
        if mode == WriteMode::CreateNew && state.object(bucket, key).is_some() {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("{bucket}/{key}"),
            ));
        }
        let modified = state.tick();
        state.buckets.entry(bucket.to_owned()).or_default().insert(
            key.to_owned(),
            Object {
                content: Bytes::copy_from_slice(content),
                modified,
            },
        );
        trace!(%bucket, %key, len = content.len(), "put");
        Ok(())
    }

    fn copy(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<()> {
        let mut state = self.lock();
        let content = state
            .object(bucket, src_key)
            .map(|obj| obj.content.clone())
            .ok_or_else(|| not_found(bucket, src_key))?;
        let modified = state.tick();
        state
            .buckets
            .entry(bucket.to_owned())
            .or_default()
            .insert(dst_key.to_owned(), Object { content, modified });
        Ok(())
    }

    fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        if let Some(b) = self.lock().buckets.get_mut(bucket) {
            b.remove(key);
        }
        Ok(())
    }

    fn list(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        token: Option<&str>,
    ) -> Result<ListPage> {
        enum Entry {
            Object(ObjectSummary),
            Prefix(String),
        }
        let state = self.lock();
        let Some(objects) = state.buckets.get(bucket) else {
            return Ok(ListPage::default());
        };
        // Entries in key order, with rolled-up prefixes in place of their
        // first key. The token is the last entry name already returned.
        let mut entries: Vec<(String, Entry)> = Vec::new();
        for (key, obj) in objects.range(prefix.to_owned()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            let name = match delimiter.and_then(|d| rest.find(d).map(|i| i + d.len())) {
                Some(end) => {
                    let common = format!("{prefix}{}", &rest[..end]);
                    if entries.last().is_some_and(|(last, _)| *last == common) {
                        continue;
                    }
                    (common.clone(), Entry::Prefix(common))
                }
                None => (
                    key.clone(),
                    Entry::Object(ObjectSummary {
                        key: key.clone(),
                        len: obj.content.len() as u64,
                    }),
                ),
            };
            entries.push(name);
        }
        let mut page = ListPage::default();
        let mut remaining = entries
            .into_iter()
            .filter(|(name, _)| token.is_none_or(|t| name.as_str() > t))
            .peekable();
        let mut last = None;
        for (name, entry) in remaining.by_ref().take(self.page_size) {
            match entry {
                Entry::Object(summary) => page.objects.push(summary),
                Entry::Prefix(common) => page.common_prefixes.push(common),
            }
            last = Some(name);
        }
        if remaining.peek().is_some() {
            page.next_token = last;
        }
        trace!(
            %bucket,
            %prefix,
            n_objects = page.objects.len(),
            n_prefixes = page.common_prefixes.len(),
            more = page.next_token.is_some(),
            "list page"
        );
        Ok(page)
    }
}
