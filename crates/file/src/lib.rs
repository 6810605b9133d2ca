//! Object source abstraction for browsing a bucket-like namespace
//!
//! This crate provides a unified interface for listing and fetching objects
//! from a local directory, an S3-compatible bucket, or an in-memory map.
//! Every backend implements [`ByteSource`], which is all the preview engine
//! needs from storage.
//!
//! # Source Types
//!
//! - **Local**: a directory on the local filesystem acting as the bucket root
//! - **S3**: a bucket on AWS S3 or any S3-compatible endpoint (MinIO)
//! - **Memory**: objects held in a map, for tests and demos
//!
//! # Keys and Prefixes
//!
//! Keys are `/`-separated and relative to the source root. A prefix lists
//! its immediate children only; folder entries carry a trailing `/` in
//! their `full_path`:
//! - `""` - the root
//! - `data/` - everything directly under `data`
//!
//! # Example
//!
//! ```ignore
//! use bucket_peek_file::{ByteSource, SourceLocation};
//!
//! let source = SourceLocation::parse("s3://my-bucket/")?.connect(&S3Options::default()).await?;
//! for entry in source.list("data/").await? {
//!     println!("{}", entry.full_path);
//! }
//! let bytes = source.get("data/users.csv").await?;
//! ```

mod local;
mod memory;
mod s3;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;

pub use local::LocalSource;
pub use memory::MemorySource;
pub use s3::{S3Options, S3Source};

/// Failures surfaced by a [`ByteSource`]
///
/// The preview engine treats these as opaque: it never retries and it
/// never tries to decode bytes it did not receive.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Storage error for {path}: {message}")]
    Backend { path: String, message: String },

    #[error("Object {path} is {size} bytes, above the {limit} byte limit")]
    TooLarge { path: String, size: u64, limit: u64 },
}

impl StorageError {
    pub(crate) fn backend(path: impl Into<String>, message: impl ToString) -> Self {
        StorageError::Backend {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Refuse `path` when `size` exceeds `limit`
    pub(crate) fn check_size(path: &str, size: u64, limit: u64) -> Result<(), Self> {
        if size > limit {
            return Err(StorageError::TooLarge {
                path: path.to_string(),
                size,
                limit,
            });
        }
        Ok(())
    }
}

/// Whether a listed entry is an object or a common prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    Folder,
    File,
}

/// One immediate child of a listed prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Last path segment (no trailing `/`)
    pub name: String,
    /// Key relative to the source root; folders end with `/`
    pub full_path: String,
    pub kind: EntryKind,
    pub size_bytes: Option<u64>,
    /// RFC 3339 timestamp when the backend reports one
    pub last_modified: Option<String>,
}

impl Entry {
    pub fn folder(full_path: impl Into<String>) -> Self {
        let mut full_path = full_path.into();
        if !full_path.ends_with('/') {
            full_path.push('/');
        }
        Self {
            name: entry_name(&full_path).to_string(),
            full_path,
            kind: EntryKind::Folder,
            size_bytes: None,
            last_modified: None,
        }
    }

    pub fn file(
        full_path: impl Into<String>,
        size_bytes: u64,
        last_modified: Option<String>,
    ) -> Self {
        let full_path = full_path.into();
        Self {
            name: entry_name(&full_path).to_string(),
            full_path,
            kind: EntryKind::File,
            size_bytes: Some(size_bytes),
            last_modified,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// Storage collaborator contract: list immediate children, fetch whole objects
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// List the immediate children of `prefix` (non-recursive)
    async fn list(&self, prefix: &str) -> Result<Vec<Entry>, StorageError>;

    /// Fetch the full content of the object at `full_path`
    async fn get(&self, full_path: &str) -> Result<Bytes, StorageError>;

    /// Fetch the object unless it is larger than `max_bytes`
    ///
    /// Backends that know the size up front refuse before reading the body.
    /// The fallback fetches first and checks afterwards.
    async fn get_within(&self, full_path: &str, max_bytes: u64) -> Result<Bytes, StorageError> {
        let bytes = self.get(full_path).await?;
        StorageError::check_size(full_path, bytes.len() as u64, max_bytes)?;
        Ok(bytes)
    }

    /// Get a display name for logging
    fn display_name(&self) -> String;
}

/// Where the objects to browse live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Local directory used as the bucket root
    Local(PathBuf),
    /// S3 bucket
    S3 { bucket: String },
}

impl SourceLocation {
    /// Parse a string into a SourceLocation, auto-detecting the source type
    ///
    /// - `s3://bucket` or `s3://bucket/` -> S3
    /// - Everything else -> Local
    pub fn parse(uri: &str) -> Result<Self> {
        if uri.starts_with("s3://") {
            let bucket = parse_s3_bucket(uri)?;
            Ok(SourceLocation::S3 { bucket })
        } else {
            Ok(SourceLocation::Local(PathBuf::from(uri)))
        }
    }

    /// Build the backend for this location
    pub async fn connect(&self, options: &S3Options) -> Result<Arc<dyn ByteSource>> {
        match self {
            SourceLocation::Local(root) => Ok(Arc::new(LocalSource::new(root.clone())?)),
            SourceLocation::S3 { bucket } => {
                let source = S3Source::connect(bucket.clone(), options)
                    .await
                    .with_context(|| format!("Failed to create S3 client for bucket {bucket}"))?;
                Ok(Arc::new(source))
            }
        }
    }

    /// Get a display name for logging
    pub fn display_name(&self) -> String {
        match self {
            SourceLocation::Local(path) => path.display().to_string(),
            SourceLocation::S3 { bucket } => format!("s3://{bucket}"),
        }
    }
}

/// Parse the bucket out of `s3://bucket` or `s3://bucket/`
pub fn parse_s3_bucket(uri: &str) -> Result<String> {
    let rest = uri
        .strip_prefix("s3://")
        .context("S3 URI must start with 's3://'")?;

    let bucket = rest.trim_end_matches('/');
    if bucket.is_empty() {
        anyhow::bail!("S3 URI must name a bucket: 's3://bucket'");
    }
    if bucket.contains('/') {
        anyhow::bail!("S3 URI must name only a bucket, browse prefixes with `ls`: {uri}");
    }

    Ok(bucket.to_string())
}

/// Last `/`-separated segment of a key, ignoring a trailing `/`
pub fn entry_name(full_path: &str) -> &str {
    let trimmed = full_path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Normalize a listing prefix: no leading `/`, trailing `/` unless empty
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

/// Order entries the way the CLI shows them: folders first, then by name
pub(crate) fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| a.full_path.cmp(&b.full_path))
    });
}
