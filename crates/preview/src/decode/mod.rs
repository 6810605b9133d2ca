//! Per-format decoders and the dispatch from detected format to decoder.
//!
//! Every decoder is a pure function of its input bytes and budgets and
//! returns a [`ViewResult`]; failures come back as error views.

pub mod avro;
pub mod csv;
pub mod json;
pub mod parquet;
pub mod raw;
pub mod xml;

use crate::config::PreviewConfig;
use crate::format::DetectedFormat;
use crate::view::ViewResult;
use bytes::Bytes;

/// Decode `bytes` with the decoder for `format`
pub fn decode(
    format: DetectedFormat,
    filename: &str,
    bytes: Bytes,
    config: &PreviewConfig,
) -> ViewResult {
    tracing::debug!(
        "Decoding {} ({} bytes) as {}",
        filename,
        bytes.len(),
        format
    );

    match format {
        DetectedFormat::Csv => csv::decode(&bytes, config.row_cap),
        DetectedFormat::Parquet => parquet::decode(bytes, config.row_cap),
        DetectedFormat::Avro => avro::decode(&bytes, config.row_cap),
        DetectedFormat::Json => json::decode(&bytes, config.row_cap),
        DetectedFormat::Xml => xml::decode(&bytes, config.row_cap),
        DetectedFormat::Unknown => raw::decode(&bytes, filename, config.byte_cap),
    }
}

/// Classify `filename` and decode `bytes` accordingly
pub fn decode_file(filename: &str, bytes: Bytes, config: &PreviewConfig) -> ViewResult {
    decode(DetectedFormat::classify(filename), filename, bytes, config)
}
