//! S3 backend with delimiter-based prefix listing

use crate::{normalize_prefix, sort_entries, ByteSource, Entry, StorageError};
use anyhow::Result;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::DateTimeFormat;
use bytes::Bytes;

/// Connection overrides on top of the standard AWS provider chain
#[derive(Debug, Clone, Default)]
pub struct S3Options {
    /// Region override (otherwise taken from the environment/profile)
    pub region: Option<String>,
    /// Custom endpoint, e.g. a MinIO server; enables path-style addressing
    pub endpoint_url: Option<String>,
}

/// Shared S3 client bound to one bucket
///
/// Creating an S3 client is relatively expensive, so one instance is built
/// at startup and reused for every request.
pub struct S3Source {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Source {
    /// Create a new S3 client from AWS config
    pub async fn connect(bucket: String, options: &S3Options) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &options.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &options.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = aws_sdk_s3::Client::from_conf(builder.build());

        tracing::info!(
            "S3 client ready for bucket {} (endpoint: {})",
            bucket,
            options.endpoint_url.as_deref().unwrap_or("default")
        );

        Ok(Self { client, bucket })
    }
}

/// Map an SDK failure onto the storage taxonomy
fn classify_sdk_error<E, R>(err: SdkError<E, R>, path: &str) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.code() {
        Some("NoSuchKey") | Some("NoSuchBucket") | Some("NotFound") => {
            StorageError::NotFound(path.to_string())
        }
        Some("AccessDenied") | Some("Forbidden") | Some("InvalidAccessKeyId")
        | Some("SignatureDoesNotMatch") => StorageError::AccessDenied(path.to_string()),
        _ => StorageError::backend(path, DisplayErrorContext(&err)),
    }
}

impl S3Source {
    /// GET the object, refusing it by `ContentLength` before the body is read
    async fn fetch(
        &self,
        full_path: &str,
        max_bytes: Option<u64>,
    ) -> Result<Bytes, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(full_path)
            .send()
            .await
            .map_err(|e| classify_sdk_error(e, full_path))?;

        if let (Some(limit), Some(length)) = (max_bytes, response.content_length()) {
            StorageError::check_size(full_path, length.max(0) as u64, limit)?;
        }

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::backend(full_path, e))?;
        let bytes = body.into_bytes();

        tracing::debug!(
            "Fetched {} bytes from s3://{}/{}",
            bytes.len(),
            self.bucket,
            full_path
        );

        Ok(bytes)
    }
}

#[async_trait]
impl ByteSource for S3Source {
    /// List immediate children using the `/` delimiter, following every page
    async fn list(&self, prefix: &str) -> Result<Vec<Entry>, StorageError> {
        let prefix = normalize_prefix(prefix);
        let mut results = Vec::new();
        let mut continuation_token: Option<String> = None;
        let mut pages = 0;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .delimiter("/");

            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| classify_sdk_error(e, &prefix))?;
            pages += 1;

            for common in response.common_prefixes() {
                if let Some(folder) = common.prefix() {
                    results.push(Entry::folder(folder));
                }
            }

            for object in response.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                // Skip the prefix itself and "directory" markers
                if key == prefix || key.ends_with('/') {
                    continue;
                }
                let modified = object
                    .last_modified()
                    .and_then(|t| t.fmt(DateTimeFormat::DateTime).ok());
                let size = object.size().unwrap_or_default().max(0) as u64;
                results.push(Entry::file(key, size, modified));
            }

            // Handle pagination
            match response.next_continuation_token() {
                Some(token) if response.is_truncated() == Some(true) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        sort_entries(&mut results);

        tracing::debug!(
            "Listed {} entries in {} page(s) of S3 prefix: s3://{}/{}",
            results.len(),
            pages,
            self.bucket,
            prefix
        );

        Ok(results)
    }

    async fn get(&self, full_path: &str) -> Result<Bytes, StorageError> {
        self.fetch(full_path, None).await
    }

    async fn get_within(&self, full_path: &str, max_bytes: u64) -> Result<Bytes, StorageError> {
        self.fetch(full_path, Some(max_bytes)).await
    }

    fn display_name(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = S3Options::default();
        assert!(options.region.is_none());
        assert!(options.endpoint_url.is_none());
    }

    // Listing and fetching need a live S3 or MinIO endpoint; the shared
    // ByteSource behaviour is covered through LocalSource and MemorySource.
}
