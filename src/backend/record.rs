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

//! A log of operations on a backend, for testing.

use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;

use super::{Backend, ListPage, ObjectMeta, WriteMode};
use crate::errors::Result;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Call {
    /// What operation?
    pub verb: Verb,
    /// The key, or for listings the prefix.
    pub key: String,
}

impl Call {
    pub fn new<K: ToString>(verb: Verb, key: K) -> Self {
        Self {
            verb,
            key: key.to_string(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Verb {
    Head,
    Get,
    Put,
    Copy,
    Delete,
    DeleteBatch,
    List,
}

/// Wraps another backend and records every call made through it.
#[derive(Debug)]
pub struct RecordingBackend {
    inner: Arc<dyn Backend>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingBackend {
    pub fn new(inner: Arc<dyn Backend>) -> RecordingBackend {
        RecordingBackend {
            inner,
            calls: Mutex::default(),
        }
    }

    fn record(&self, verb: Verb, key: &str) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Call::new(verb, key));
    }

    /// Return a copy of the recorded calls.
    pub fn recorded_calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take out all the recorded calls, clearing the record.
    pub fn take_recorded_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Backend for RecordingBackend {
    fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>> {
        self.record(Verb::Head, key);
        self.inner.head(bucket, key)
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        self.record(Verb::Get, key);
        self.inner.get(bucket, key)
    }

    fn put(&self, bucket: &str, key: &str, content: &[u8], mode: WriteMode) -> Result<()> {
        self.record(Verb::Put, key);
        self.inner.put(bucket, key, content, mode)
    }

    fn copy(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<()> {
        self.record(Verb::Copy, dst_key);
        self.inner.copy(bucket, src_key, dst_key)
    }

    fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        self.record(Verb::Delete, key);
        self.inner.delete(bucket, key)
    }

    fn delete_batch(&self, bucket: &str, keys: &[String]) -> Result<()> {
        self.record(Verb::DeleteBatch, &keys.join(","));
        self.inner.delete_batch(bucket, keys)
    }

    fn list(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        token: Option<&str>,
    ) -> Result<ListPage> {
        self.record(Verb::List, prefix);
        self.inner.list(bucket, prefix, delimiter, token)
    }
}
