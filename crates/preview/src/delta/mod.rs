//! Delta Lake table snapshots.
//!
//! A table is a folder holding parquet data files plus a `_delta_log/`
//! folder of newline-delimited JSON commits (and optional parquet
//! checkpoints). Replaying the log yields the set of live data files, which
//! are then decoded in path order until the row cap is reached.

pub mod log;
pub mod schema;

use crate::config::PreviewConfig;
use crate::decode::parquet as parquet_decoder;
use crate::error::{PreviewError, Result};
use crate::normalize::ColumnIndex;
use crate::truncate::RowBudget;
use crate::view::{Cell, TableView, ViewResult};
use bucket_peek_file::{normalize_prefix, ByteSource};
use self::log::{data_file_rows, delta_error, DataFile, Snapshot};

/// Preview the Delta table rooted at `table_path`
///
/// `config.max_object_bytes` applies to every data file and checkpoint part.
pub async fn decode(
    source: &dyn ByteSource,
    table_path: &str,
    config: &PreviewConfig,
) -> ViewResult {
    let outcome = read_snapshot(source, table_path, config)
        .await
        .map_err(|e| match e {
            PreviewError::Parse {
                format: log::DELTA_FORMAT,
                ..
            } => e,
            other => delta_error(other),
        });
    ViewResult::from_outcome(outcome)
}

async fn read_snapshot(
    source: &dyn ByteSource,
    table_path: &str,
    config: &PreviewConfig,
) -> Result<ViewResult> {
    let row_cap = config.row_cap;
    let max_bytes = config.max_object_bytes as u64;
    let table_root = normalize_prefix(table_path);
    let snapshot = Snapshot::load(source, &table_root, max_bytes).await?;

    let schema_string = snapshot
        .schema_string
        .as_deref()
        .ok_or_else(|| delta_error("transaction log has no metaData action"))?;
    let fields = schema::parse_fields(schema_string)?;

    let columns = fields
        .iter()
        .map(|f| f.name.clone())
        .filter(|name| !snapshot.partition_columns.contains(name))
        .chain(snapshot.partition_columns.iter().cloned());
    let index = ColumnIndex::new(columns);

    let mut budget = RowBudget::new(row_cap);
    let mut rows = Vec::new();

    for file in snapshot.files.values() {
        if budget.truncated() {
            break;
        }
        if budget.remaining() == 0 {
            budget.observe(data_file_rows(source, &table_root, file, max_bytes).await?);
            continue;
        }

        let key = format!("{table_root}{}", file.path);
        let bytes = source.get_within(&key, max_bytes).await?;
        let data = parquet_decoder::read_rows(bytes, budget.remaining())
            .map_err(|e| delta_error(format!("data file {}: {e}", file.path)))?;

        let read = data.rows.len();
        for row in data.rows {
            budget.admit();
            rows.push(snapshot_row(&index, &data.columns, row, file));
        }
        budget.observe(data.total_rows.saturating_sub(read));
    }

    let version = snapshot.version.unwrap_or_default();
    let mut table = TableView::new(index.into_columns(), row_cap);
    table.truncated = budget.truncated();
    table
        .metadata
        .insert("version".to_string(), version.to_string());
    table
        .metadata
        .insert("files".to_string(), snapshot.files.len().to_string());
    table
        .metadata
        .insert("schema".to_string(), schema::schema_text(&fields));
    for row in rows {
        table.push_row(row);
    }

    tracing::debug!(
        "Decoded Delta table {} at version {}: {} rows from {} live files",
        table_root,
        version,
        table.total_rows_emitted(),
        snapshot.files.len()
    );

    Ok(ViewResult::Snapshot(table))
}

/// Place a data file row and the file's partition values into table order
fn snapshot_row(
    index: &ColumnIndex,
    columns: &[String],
    values: Vec<Cell>,
    file: &DataFile,
) -> Vec<Cell> {
    let mut row = index.blank_row();
    for (column, value) in columns.iter().zip(values) {
        index.set(&mut row, column, value);
    }
    for (column, value) in &file.partition_values {
        let cell = value.as_deref().map_or(Cell::Null, Cell::text);
        index.set(&mut row, column, cell);
    }
    row
}
