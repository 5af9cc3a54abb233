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

//! Bucket and key names for object store paths.
//!
//! Object stores have no directories. A key ending in `/` is a zero-byte
//! directory marker, and the same name without the slash is a file. Both
//! may exist at once.

use crate::pure_path::PurePath;

/// Strip one trailing `/`, giving the key of a file object.
pub fn to_file_key(key: &str) -> &str {
    key.strip_suffix('/').unwrap_or(key)
}

/// Add a trailing `/` if absent, giving the key of a directory marker.
///
/// The bucket root's key `""` becomes `"/"`, which is never stored as an
/// object; callers treat it as always present.
pub fn to_dir_key(key: &str) -> String {
    if key.ends_with('/') {
        key.to_owned()
    } else {
        format!("{key}/")
    }
}

impl PurePath {
    /// The bucket name: the authority of the drive.
    ///
    /// Empty for a path without a drive.
    pub fn bucket(&self) -> &str {
        let drive = self.drive();
        drive
            .find("://")
            .map_or("", |i| &drive[i + 3..])
            .trim_end_matches('/')
    }

    /// The object key: the segments joined by `/`, without a leading or
    /// trailing slash.
    pub fn key(&self) -> String {
        self.segments().join("/")
    }
}
