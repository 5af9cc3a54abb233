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

//! Process-wide backend clients, one per object store.
//!
//! The default client for a store is built from the environment the first
//! time a path of that store is used. Applications and tests can install
//! their own client with [register_client], which should be done during
//! single-threaded setup, before any path of that store is used: a path that
//! has already fetched the old client keeps using it.
//!
//! Alternatively a client can be attached to one path with
//! [crate::Path::with_client], bypassing this registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;
use tracing::debug;

use crate::backend::Backend;
use crate::errors::{Error, ErrorKind, Result};
use crate::scheme::Store;

lazy_static! {
    static ref CLIENTS: RwLock<HashMap<Store, Arc<dyn Backend>>> = RwLock::default();
}

/// Install the client used for all paths of a store.
pub fn register_client(store: Store, backend: Arc<dyn Backend>) {
    debug!(?store, ?backend, "register client");
    CLIENTS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(store, backend);
}

/// Forget the client for a store, so that the next use builds a new default.
pub fn unregister_client(store: Store) {
    CLIENTS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&store);
}

/// Return the registered client for a store, building the default if none
/// has been registered.
pub fn client(store: Store) -> Result<Arc<dyn Backend>> {
    if let Some(backend) = CLIENTS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&store)
    {
        return Ok(Arc::clone(backend));
    }
    let backend = default_client(store)?;
    // Another thread may have raced us here; keep whichever got in first.
    Ok(Arc::clone(
        CLIENTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(store)
            .or_insert(backend),
    ))
}

fn default_client(store: Store) -> Result<Arc<dyn Backend>> {
    debug!(?store, "create default client");
    match store {
        #[cfg(feature = "s3")]
        Store::S3 => Ok(Arc::new(crate::backend::s3::S3Backend::new(
            &crate::backend::s3::S3Options::from_env(),
        )?)),
        #[cfg(feature = "gcs")]
        Store::Gcs => Ok(Arc::new(crate::backend::gcs::GcsBackend::new(
            crate::backend::gcs::GcsOptions::from_env(),
        )?)),
        _ => Err(Error::new(ErrorKind::Unsupported, store.flavour().name())
            .with_source("no client is available for this store")),
    }
}
