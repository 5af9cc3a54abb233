// Copyright 2023-2025 Martin Pool.

// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

//! Access to AWS S3, or compatible object storage.

// This file needs AWS credentials or an S3-compatible endpoint to exercise
// for real, so most of its behavior is covered through the in-memory
// backend instead, which follows the same contract.

use std::env;
use std::fmt;
use std::sync::Arc;

use aws_config::meta::region::RegionProviderChain;
use aws_config::{AppName, BehaviorVersion};
use aws_sdk_s3::error::{BuildError, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::DateTime;
use aws_sdk_s3::types::{Delete, MetadataDirective, ObjectIdentifier};
use aws_types::region::Region;
use base64::Engine;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use time::OffsetDateTime;
use tokio::runtime::Runtime;
use tracing::{debug, trace, trace_span};

use super::{Backend, ListPage, ObjectMeta, ObjectSummary, WriteMode};
use crate::errors::{Error, ErrorKind, Result};

/// S3 accepts at most this many keys per DeleteObjects request.
const DELETE_BATCH_SIZE: usize = 1000;

/// Characters escaped in the `x-amz-copy-source` header.
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Settings for connecting to S3.
///
/// Anything left as `None` is taken from the usual AWS environment
/// variables and config files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct S3Options {
    pub region: Option<String>,
    /// Endpoint of an S3-compatible store, like `http://localhost:9000`.
    pub endpoint_url: Option<String>,
    /// Address buckets as `endpoint/bucket` rather than `bucket.endpoint`,
    /// as most S3-compatible stores need.
    pub force_path_style: bool,
}

impl S3Options {
    /// Read options from `AWS_REGION`, `AWS_ENDPOINT_URL`, and
    /// `ANYPATH_S3_FORCE_PATH_STYLE`.
    pub fn from_env() -> S3Options {
        let var = |name: &str| env::var(name).ok().filter(|v: &String| !v.is_empty());
        S3Options {
            region: var("AWS_REGION"),
            endpoint_url: var("AWS_ENDPOINT_URL"),
            force_path_style: var("ANYPATH_S3_FORCE_PATH_STYLE")
                .is_some_and(|v| !matches!(v.as_str(), "0" | "false" | "no")),
        }
    }
}

pub struct S3Backend {
    /// Tokio runtime specifically for S3 IO.
    ///
    /// The S3 SDK is built on Tokio but paths are used synchronously.
    /// Each call blocks the calling thread until the request is complete.
    runtime: Arc<Runtime>,

    client: Arc<aws_sdk_s3::Client>,
}

impl fmt::Debug for S3Backend {
    #[mutants::skip] // unimportant to test
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Backend").finish_non_exhaustive()
    }
}

impl S3Backend {
    pub fn new(options: &S3Options) -> Result<S3Backend> {
        // Like in <https://tokio.rs/tokio/topics/bridging>.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| Error::new(ErrorKind::Other, "s3").with_source(err))?;

        // Use us-east-1 if no region is configured anywhere.
        let region = RegionProviderChain::first_try(options.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new("us-east-1"));
        let app_name = AppName::new(format!("anypath-{}", crate::version()))
            .map_err(|err| Error::new(ErrorKind::Other, "s3").with_source(err))?;
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .app_name(app_name)
            .region(region);
        if let Some(endpoint_url) = &options.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let config = runtime.block_on(loader.load());
        debug!(region = ?config.region(), ?options, "S3 client configured");
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(options.force_path_style)
            .build();
        Ok(S3Backend {
            client: Arc::new(aws_sdk_s3::Client::from_conf(s3_config)),
            runtime: Arc::new(runtime),
        })
    }
}

impl Backend for S3Backend {
    fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>> {
        let _span = trace_span!("S3Backend::head", %bucket, %key).entered();
        let request = self.client.head_object().bucket(bucket).key(key);
        match self.runtime.block_on(request.send()) {
            Ok(response) => {
                let len = response
                    .content_length()
                    .and_then(|len| u64::try_from(len).ok())
                    .unwrap_or_default();
                let modified = response
                    .last_modified()
                    .map_or(OffsetDateTime::UNIX_EPOCH, to_offset_date_time);
                trace!(len, "object exists");
                Ok(Some(ObjectMeta { len, modified }))
            }
            Err(SdkError::ServiceError(err)) if matches!(err.err(), HeadObjectError::NotFound(_)) => {
                trace!("object does not exist");
                Ok(None)
            }
            Err(err) => Err(s3_error(bucket, key, err)),
        }
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let _span = trace_span!("S3Backend::get", %bucket, %key).entered();
        let request = self.client.get_object().bucket(bucket).key(key);
        let response = self
            .runtime
            .block_on(request.send())
            .map_err(|err| s3_error(bucket, key, err))?;
        let body = self
            .runtime
            .block_on(response.body.collect())
            .map_err(|err| Error::new(ErrorKind::Other, object_name(bucket, key)).with_source(err))?
            .into_bytes();
        trace!(body_len = body.len(), "read object");
        Ok(body)
    }

    fn put(&self, bucket: &str, key: &str, content: &[u8], mode: WriteMode) -> Result<()> {
        let _span = trace_span!("S3Backend::put", %bucket, %key, ?mode).entered();
        let crc32c =
            base64::engine::general_purpose::STANDARD.encode(crc32c::crc32c(content).to_be_bytes());
        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .checksum_crc32_c(crc32c)
            .body(content.to_owned().into());
        if mode == WriteMode::CreateNew {
            request = request.if_none_match("*");
        }
        self.runtime
            .block_on(request.send())
            .map_err(|err| s3_error(bucket, key, err))?;
        trace!(body_len = content.len(), "wrote object");
        Ok(())
    }

    fn copy(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<()> {
        let _span = trace_span!("S3Backend::copy", %bucket, %src_key, %dst_key).entered();
        let source = format!("{bucket}/{}", utf8_percent_encode(src_key, COPY_SOURCE));
        // Replacing the metadata is what allows copying an object onto itself.
        let request = self
            .client
            .copy_object()
            .bucket(bucket)
            .copy_source(source)
            .key(dst_key)
            .metadata_directive(MetadataDirective::Replace);
        self.runtime
            .block_on(request.send())
            .map_err(|err| s3_error(bucket, src_key, err))?;
        Ok(())
    }

    fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let _span = trace_span!("S3Backend::delete", %bucket, %key).entered();
        let request = self.client.delete_object().bucket(bucket).key(key);
        self.runtime
            .block_on(request.send())
            .map_err(|err| s3_error(bucket, key, err))?;
        trace!("deleted object");
        Ok(())
    }

    fn delete_batch(&self, bucket: &str, keys: &[String]) -> Result<()> {
        let _span = trace_span!("S3Backend::delete_batch", %bucket, n_keys = keys.len()).entered();
        let build_error = |err: BuildError| Error::new(ErrorKind::Other, bucket).with_source(err);
        for chunk in keys.chunks(DELETE_BATCH_SIZE) {
            let objects = chunk
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(build_error)?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(build_error)?;
            let request = self.client.delete_objects().bucket(bucket).delete(delete);
            let response = self
                .runtime
                .block_on(request.send())
                .map_err(|err| s3_error(bucket, "", err))?;
            if let Some(failed) = response.errors().first() {
                debug!(?failed, "DeleteObjects reported a failure");
                return Err(Error::new(
                    ErrorKind::Other,
                    object_name(bucket, failed.key().unwrap_or_default()),
                )
                .with_source(failed.message().unwrap_or("delete failed").to_owned()));
            }
            trace!(n_keys = chunk.len(), "deleted batch");
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
        let _span = trace_span!("S3Backend::list", %bucket, %prefix, ?delimiter).entered();
        let request = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_delimiter(delimiter.map(str::to_owned))
            .set_continuation_token(token.map(str::to_owned));
        let response = self
            .runtime
            .block_on(request.send())
            .map_err(|err| s3_error(bucket, prefix, err))?;
        let mut page = ListPage::default();
        for common_prefix in response.common_prefixes() {
            if let Some(name) = common_prefix.prefix() {
                trace!(%name, "S3 common prefix");
                page.common_prefixes.push(name.to_owned());
            }
        }
        for object in response.contents() {
            if let Some(key) = object.key() {
                trace!(%key, "S3 object");
                page.objects.push(ObjectSummary {
                    key: key.to_owned(),
                    len: object
                        .size()
                        .and_then(|s| u64::try_from(s).ok())
                        .unwrap_or_default(),
                });
            }
        }
        if response.is_truncated() == Some(true) {
            page.next_token = response.next_continuation_token().map(str::to_owned);
        }
        Ok(page)
    }
}

fn to_offset_date_time(t: &DateTime) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(t.as_nanos()).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

fn object_name(bucket: &str, key: &str) -> String {
    format!("s3://{bucket}/{key}")
}

/// Classify an S3 error by its error code, which is available uniformly
/// across operations.
fn error_kind(code: Option<&str>) -> ErrorKind {
    match code {
        Some("NoSuchKey" | "NoSuchBucket" | "NotFound") => ErrorKind::NotFound,
        // Conditional create lost against an existing or concurrent write.
        Some("PreconditionFailed" | "ConditionalRequestConflict") => ErrorKind::AlreadyExists,
        Some("AccessDenied") => ErrorKind::PermissionDenied,
        _ => ErrorKind::Other,
    }
}

fn s3_error<E, R>(bucket: &str, key: &str, source: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: fmt::Debug + Send + Sync + 'static,
{
    debug!(s3_error = ?source);
    let kind = error_kind(source.code());
    Error::new(kind, object_name(bucket, key)).with_source(source)
}
