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

//! Filesystem-style paths over local disks, HTTP, and object stores.
//!
//! [PurePath] does lexical path manipulation for POSIX, Windows, and URI
//! style paths, without touching any filesystem. [Path] adds operations:
//! local paths go to the OS, `http(s)://` paths can be read, and `s3://` and
//! `gs://` paths go to an object store [Backend], with directories emulated
//! by zero-byte marker objects.

pub mod backend;
pub mod blob;
pub mod clients;
pub mod emulate;
pub mod errors;
pub mod flavour;
#[cfg(feature = "http")]
mod http;
mod local;
pub mod path;
pub mod pure_path;
pub mod scheme;

pub use crate::backend::memory::MemoryBackend;
pub use crate::backend::record::RecordingBackend;
pub use crate::backend::{Backend, ListPage, ObjectMeta, ObjectSummary, WriteMode};
pub use crate::clients::{register_client, unregister_client};
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::flavour::Flavour;
pub use crate::path::Path;
pub use crate::pure_path::{Parents, PurePath};
pub use crate::scheme::{
    register_path_kind, register_pure_kind, LocalStyle, PathKind, Registry, Store,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The version of this library, as used in client identification.
pub fn version() -> &'static str {
    VERSION
}
