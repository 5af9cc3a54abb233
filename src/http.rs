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

//! Read-only access to `http://` and `https://` paths.

use bytes::Bytes;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, trace_span};

use crate::errors::{Error, ErrorKind, Result};

fn client(url: &str) -> Result<Client> {
    Client::builder()
        .user_agent(format!("anypath/{}", crate::version()))
        .build()
        .map_err(|err| Error::new(ErrorKind::Other, url).with_source(err))
}

/// Fetch the whole body of a URL.
pub(crate) fn read_bytes(url: &str) -> Result<Bytes> {
    let _span = trace_span!("http::read_bytes", %url).entered();
    let response = client(url)?
        .get(url)
        .send()
        .map_err(|err| Error::new(ErrorKind::Other, url).with_source(err))?;
    let status = response.status();
    if !status.is_success() {
        debug!(%status, "HTTP error");
        let kind = match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => ErrorKind::NotFound,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::PermissionDenied,
            _ => ErrorKind::Other,
        };
        return Err(Error::new(kind, url).with_source(format!("HTTP {status}")));
    }
    response
        .bytes()
        .map_err(|err| Error::new(ErrorKind::Other, url).with_source(err))
}
