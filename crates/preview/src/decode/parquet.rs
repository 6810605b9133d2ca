//! Columnar file decoder

use crate::error::{PreviewError, Result};
use crate::normalize::unique_columns;
use crate::view::{Cell, TableView, ViewResult};
use arrow::array::{Array, AsArray, RecordBatch};
use arrow::datatypes::{
    DataType, Float16Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    Schema, SchemaRef, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

const MAX_BATCH_ROWS: usize = 8192;

/// Decode a parquet file, materializing at most `row_cap` rows
pub fn decode(bytes: Bytes, row_cap: usize) -> ViewResult {
    ViewResult::from_outcome(read_table(bytes, row_cap))
}

fn read_table(bytes: Bytes, row_cap: usize) -> Result<ViewResult> {
    let file = read_rows(bytes, row_cap)?;

    let mut table = TableView::new(unique_columns(file.columns), row_cap);
    table.truncated = file.total_rows > row_cap;
    table
        .metadata
        .insert("schema".to_string(), schema_text(&file.schema));
    for row in file.rows {
        table.push_row(row);
    }

    Ok(ViewResult::Table(table))
}

/// Rows read from one parquet file
pub(crate) struct ParquetRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Row count recorded in the footer
    pub total_rows: usize,
    pub schema: SchemaRef,
}

/// Read the footer and the first `limit` rows
pub(crate) fn read_rows(bytes: Bytes, limit: usize) -> Result<ParquetRows> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(bytes).map_err(parquet_error)?;

    let total_rows = builder.metadata().file_metadata().num_rows().max(0) as usize;
    let schema = builder.schema().clone();
    let columns = schema.fields().iter().map(|f| f.name().clone()).collect();

    let mut rows = Vec::with_capacity(limit.min(total_rows));
    if limit > 0 {
        let reader = builder
            .with_batch_size(limit.min(MAX_BATCH_ROWS))
            .with_limit(limit)
            .build()
            .map_err(parquet_error)?;

        for batch in reader {
            let batch = batch.map_err(parquet_error)?;
            append_batch(&batch, &mut rows)?;
            if rows.len() >= limit {
                break;
            }
        }
        rows.truncate(limit);
    }

    tracing::debug!(
        "Decoded parquet: {} rows of {} from footer",
        rows.len(),
        total_rows
    );

    Ok(ParquetRows {
        columns,
        rows,
        total_rows,
        schema,
    })
}

/// Row count from the footer only
pub(crate) fn row_count(bytes: Bytes) -> Result<usize> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(bytes).map_err(parquet_error)?;
    Ok(builder.metadata().file_metadata().num_rows().max(0) as usize)
}

fn parquet_error(err: impl ToString) -> PreviewError {
    PreviewError::parse("Parquet", err)
}

fn append_batch(batch: &RecordBatch, rows: &mut Vec<Vec<Cell>>) -> Result<()> {
    let options = FormatOptions::default();
    let formatters = batch
        .columns()
        .iter()
        .map(|array| ArrayFormatter::try_new(array.as_ref(), &options))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(parquet_error)?;

    for row_idx in 0..batch.num_rows() {
        let row = batch
            .columns()
            .iter()
            .zip(&formatters)
            .map(|(array, formatter)| arrow_cell(array.as_ref(), row_idx, formatter))
            .collect();
        rows.push(row);
    }
    Ok(())
}

/// Convert one arrow value to a display cell
///
/// Numbers and booleans keep their type; everything else (dates, decimals,
/// nested values) uses arrow's display formatting.
pub(crate) fn arrow_cell(array: &dyn Array, idx: usize, formatter: &ArrayFormatter) -> Cell {
    if array.is_null(idx) {
        return Cell::Null;
    }
    match array.data_type() {
        DataType::Boolean => Cell::Bool(array.as_boolean().value(idx)),
        DataType::Int8 => Cell::Int(array.as_primitive::<Int8Type>().value(idx).into()),
        DataType::Int16 => Cell::Int(array.as_primitive::<Int16Type>().value(idx).into()),
        DataType::Int32 => Cell::Int(array.as_primitive::<Int32Type>().value(idx).into()),
        DataType::Int64 => Cell::Int(array.as_primitive::<Int64Type>().value(idx)),
        DataType::UInt8 => Cell::Int(array.as_primitive::<UInt8Type>().value(idx).into()),
        DataType::UInt16 => Cell::Int(array.as_primitive::<UInt16Type>().value(idx).into()),
        DataType::UInt32 => Cell::Int(array.as_primitive::<UInt32Type>().value(idx).into()),
        DataType::UInt64 => {
            let v = array.as_primitive::<UInt64Type>().value(idx);
            i64::try_from(v)
                .map(Cell::Int)
                .unwrap_or_else(|_| Cell::Text(v.to_string()))
        }
        DataType::Float16 => {
            Cell::Float(array.as_primitive::<Float16Type>().value(idx).to_f64())
        }
        DataType::Float32 => Cell::Float(array.as_primitive::<Float32Type>().value(idx).into()),
        DataType::Float64 => Cell::Float(array.as_primitive::<Float64Type>().value(idx)),
        DataType::Utf8 => Cell::text(array.as_string::<i32>().value(idx)),
        DataType::LargeUtf8 => Cell::text(array.as_string::<i64>().value(idx)),
        _ => Cell::Text(formatter.value(idx).to_string()),
    }
}

/// Textual schema summary, one `name: type` line per field
pub(crate) fn schema_text(schema: &Schema) -> String {
    schema
        .fields()
        .iter()
        .map(|f| {
            let suffix = if f.is_nullable() { "" } else { " not null" };
            format!("{}: {}{}", f.name(), f.data_type(), suffix)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
