//! Error types for the preview engine.

use bucket_peek_file::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Errors a decoder can hit before it is able to produce a view.
///
/// These never leave the crate as `Err`: each decoder converts them into
/// [`crate::ViewResult::Error`] at its boundary.
#[derive(Error, Debug)]
pub enum PreviewError {
    /// Bytes are malformed for the format they claim to be.
    #[error("Error reading {format}: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// Text was required but the bytes are not valid UTF-8.
    #[error("Error decoding file encoding: {0}")]
    Encoding(String),

    /// Nothing can represent the object (e.g. it exceeds the fetch ceiling).
    #[error("Unsupported file: {0}")]
    UnsupportedFormat(String),

    /// The storage collaborator failed to deliver bytes.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PreviewError {
    pub(crate) fn parse(format: &'static str, err: impl ToString) -> Self {
        PreviewError::Parse {
            format,
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PreviewError::Parse { .. } => ErrorKind::Parse,
            PreviewError::Encoding(_) => ErrorKind::Encoding,
            PreviewError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            PreviewError::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Error class carried by an error view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Parse,
    Encoding,
    UnsupportedFormat,
    Storage,
}

pub type Result<T> = std::result::Result<T, PreviewError>;
