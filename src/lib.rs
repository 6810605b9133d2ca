//! bucket-peek library
//!
//! Command-line option groups and the plain-text renderer used by the
//! `bucket-peek` binary. The preview engine itself lives in
//! `bucket_peek_preview`; object sources live in `bucket_peek_file`.
//!
//! # CLI Usage
//!
//! ```bash
//! # List the root of a bucket
//! bucket-peek --bucket my-bucket ls
//!
//! # Preview a file from a MinIO server
//! bucket-peek --bucket my-bucket --endpoint-url http://localhost:9000 view data/users.parquet
//!
//! # Preview a Delta table from a local directory, as JSON
//! bucket-peek --local-root ./warehouse delta tables/events --output json
//! ```

use anyhow::Context;
use bucket_peek_file::{S3Options, SourceLocation};
use bucket_peek_preview::config::{DEFAULT_BYTE_CAP, DEFAULT_MAX_OBJECT_BYTES, DEFAULT_ROW_CAP};
use bucket_peek_preview::PreviewConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub mod render;

/// Where to read objects from
#[derive(Parser, Clone, Debug)]
pub struct SourceOpts {
    /// Bucket to browse (`name` or `s3://name`)
    #[arg(long, env = "S3_BUCKET_NAME")]
    pub bucket: Option<String>,

    /// Browse a local directory instead of a bucket (takes precedence)
    #[arg(long, value_name = "DIR")]
    pub local_root: Option<PathBuf>,

    /// Custom S3 endpoint (e.g. MinIO); enables path-style addressing
    #[arg(long, env = "S3_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// AWS region override
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,
}

impl SourceOpts {
    pub fn location(&self) -> anyhow::Result<SourceLocation> {
        match (&self.local_root, &self.bucket) {
            (Some(root), _) => Ok(SourceLocation::Local(root.clone())),
            (None, Some(bucket)) if bucket.starts_with("s3://") => SourceLocation::parse(bucket)
                .with_context(|| format!("Invalid bucket: {bucket}")),
            (None, Some(bucket)) => SourceLocation::parse(&format!("s3://{bucket}"))
                .with_context(|| format!("Invalid bucket: {bucket}")),
            (None, None) => {
                anyhow::bail!("No source given: pass --bucket (or S3_BUCKET_NAME) or --local-root")
            }
        }
    }

    pub fn s3_options(&self) -> S3Options {
        S3Options {
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
        }
    }
}

/// Preview budgets
#[derive(Parser, Clone, Debug)]
pub struct PreviewOpts {
    /// Maximum rows shown for tabular files
    #[arg(long, default_value_t = DEFAULT_ROW_CAP, env = "MAX_PREVIEW_ROWS")]
    pub max_preview_rows: usize,

    /// Maximum bytes shown for raw text and binary files
    #[arg(long, default_value_t = DEFAULT_BYTE_CAP, env = "MAX_PREVIEW_BYTES")]
    pub max_preview_bytes: usize,

    /// Objects larger than this are not previewed
    #[arg(long, default_value_t = DEFAULT_MAX_OBJECT_BYTES, env = "MAX_OBJECT_BYTES")]
    pub max_object_bytes: usize,
}

impl PreviewOpts {
    pub fn config(&self) -> PreviewConfig {
        PreviewConfig::default()
            .with_row_cap(self.max_preview_rows)
            .with_byte_cap(self.max_preview_bytes)
            .with_max_object_bytes(self.max_object_bytes)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned plain text
    #[default]
    Text,
    /// The view as JSON
    Json,
}
