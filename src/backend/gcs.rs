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

//! Access to Google Cloud Storage through its JSON API.
//!
//! Requests are authenticated with a bearer token from the environment, if
//! one is set. Setting `STORAGE_EMULATOR_HOST` points the client at a local
//! emulator instead of Google.

use std::env;

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, trace, trace_span};

use super::{Backend, ListPage, ObjectMeta, ObjectSummary, WriteMode};
use crate::errors::{Error, ErrorKind, Result};

pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Object names are escaped as a single path segment, slashes included.
const OBJECT_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Settings for connecting to GCS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GcsOptions {
    /// Base URL of the API, without a trailing slash.
    pub endpoint: String,
    /// OAuth2 access token, sent as a bearer token.
    pub token: Option<String>,
}

impl Default for GcsOptions {
    fn default() -> Self {
        GcsOptions {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            token: None,
        }
    }
}

impl GcsOptions {
    /// Read options from `STORAGE_EMULATOR_HOST` and `GOOGLE_OAUTH_ACCESS_TOKEN`.
    pub fn from_env() -> GcsOptions {
        let endpoint = match env::var("STORAGE_EMULATOR_HOST") {
            Ok(host) if !host.is_empty() => normalize_endpoint(&host),
            _ => DEFAULT_ENDPOINT.to_owned(),
        };
        GcsOptions {
            endpoint,
            token: env::var("GOOGLE_OAUTH_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
        }
    }
}

/// Emulator hosts are often given without a scheme, like `localhost:4443`.
fn normalize_endpoint(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.contains("://") {
        host.to_owned()
    } else {
        format!("http://{host}")
    }
}

#[derive(Debug)]
pub struct GcsBackend {
    client: Client,
    options: GcsOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectResource {
    name: String,
    /// The JSON API sends 64-bit integers as strings.
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    updated: Option<String>,
}

impl ObjectResource {
    fn len(&self) -> u64 {
        self.size
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectResource>,
    #[serde(default)]
    prefixes: Vec<String>,
    next_page_token: Option<String>,
}

impl GcsBackend {
    pub fn new(options: GcsOptions) -> Result<GcsBackend> {
        let client = Client::builder()
            .user_agent(format!("anypath/{}", crate::version()))
            .build()
            .map_err(|err| Error::new(ErrorKind::Other, "gs://").with_source(err))?;
        debug!(endpoint = %options.endpoint, has_token = options.token.is_some(), "GCS client configured");
        Ok(GcsBackend { client, options })
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.options.endpoint,
            utf8_percent_encode(bucket, OBJECT_NAME),
            utf8_percent_encode(key, OBJECT_NAME)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.options.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request, turning transport failures and error statuses into errors.
    fn send(&self, request: RequestBuilder, bucket: &str, key: &str) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .map_err(|err| Error::new(ErrorKind::Other, object_name(bucket, key)).with_source(err))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        debug!(%status, %body, "GCS error response");
        Err(Error::new(status_kind(status), object_name(bucket, key))
            .with_source(format!("HTTP {status}: {body}")))
    }
}

fn object_name(bucket: &str, key: &str) -> String {
    format!("gs://{bucket}/{key}")
}

fn status_kind(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        // ifGenerationMatch=0 failed: the object already exists.
        StatusCode::PRECONDITION_FAILED => ErrorKind::AlreadyExists,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::PermissionDenied,
        _ => ErrorKind::Other,
    }
}

fn json_error(bucket: &str, key: &str, err: reqwest::Error) -> Error {
    Error::new(ErrorKind::Other, object_name(bucket, key)).with_source(err)
}

impl Backend for GcsBackend {
    fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>> {
        let _span = trace_span!("GcsBackend::head", %bucket, %key).entered();
        let request = self.client.get(self.object_url(bucket, key));
        let response = match self.send(request, bucket, key) {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                trace!("object does not exist");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let object: ObjectResource = response
            .json()
            .map_err(|err| json_error(bucket, key, err))?;
        let modified = object
            .updated
            .as_deref()
            .and_then(|t| OffsetDateTime::parse(t, &Rfc3339).ok())
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        trace!(len = object.len(), "object exists");
        Ok(Some(ObjectMeta {
            len: object.len(),
            modified,
        }))
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let _span = trace_span!("GcsBackend::get", %bucket, %key).entered();
        let request = self
            .client
            .get(self.object_url(bucket, key))
            .query(&[("alt", "media")]);
        let body = self
            .send(request, bucket, key)?
            .bytes()
            .map_err(|err| json_error(bucket, key, err))?;
        trace!(body_len = body.len(), "read object");
        Ok(body)
    }

    fn put(&self, bucket: &str, key: &str, content: &[u8], mode: WriteMode) -> Result<()> {
        let _span = trace_span!("GcsBackend::put", %bucket, %key, ?mode).entered();
        let url = format!(
            "{}/upload/storage/v1/b/{}/o",
            self.options.endpoint,
            utf8_percent_encode(bucket, OBJECT_NAME)
        );
        let mut request = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", key)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(content.to_owned());
        if mode == WriteMode::CreateNew {
            request = request.query(&[("ifGenerationMatch", "0")]);
        }
        self.send(request, bucket, key)?;
        trace!(body_len = content.len(), "wrote object");
        Ok(())
    }

    fn copy(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<()> {
        let _span = trace_span!("GcsBackend::copy", %bucket, %src_key, %dst_key).entered();
        let url = format!(
            "{}/copyTo/b/{}/o/{}",
            self.object_url(bucket, src_key),
            utf8_percent_encode(bucket, OBJECT_NAME),
            utf8_percent_encode(dst_key, OBJECT_NAME)
        );
        self.send(self.client.post(url), bucket, src_key)?;
        Ok(())
    }

    fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let _span = trace_span!("GcsBackend::delete", %bucket, %key).entered();
        match self.send(self.client.delete(self.object_url(bucket, key)), bucket, key) {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn list(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        token: Option<&str>,
    ) -> Result<ListPage> {
        let _span = trace_span!("GcsBackend::list", %bucket, %prefix, ?delimiter).entered();
        let url = format!(
            "{}/storage/v1/b/{}/o",
            self.options.endpoint,
            utf8_percent_encode(bucket, OBJECT_NAME)
        );
        let mut request = self.client.get(url).query(&[("prefix", prefix)]);
        if let Some(delimiter) = delimiter {
            request = request.query(&[("delimiter", delimiter)]);
        }
        if let Some(token) = token {
            request = request.query(&[("pageToken", token)]);
        }
        let list: ObjectList = self
            .send(request, bucket, prefix)?
            .json()
            .map_err(|err| json_error(bucket, prefix, err))?;
        trace!(
            n_items = list.items.len(),
            n_prefixes = list.prefixes.len(),
            "GCS list page"
        );
        Ok(ListPage {
            objects: list
                .items
                .iter()
                .map(|item| ObjectSummary {
                    key: item.name.clone(),
                    len: item.len(),
                })
                .collect(),
            common_prefixes: list.prefixes,
            next_token: list.next_page_token.filter(|t| !t.is_empty()),
        })
    }
}
