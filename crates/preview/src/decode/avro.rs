//! Avro object container decoder

use crate::error::{PreviewError, Result};
use crate::normalize::ColumnIndex;
use crate::view::{Cell, TableView, ViewResult};
use apache_avro::types::Value;
use apache_avro::Reader;

/// Decode an Avro container, reading at most `row_cap` records
///
/// Records are pulled lazily from the reader, so blocks past the cap are
/// never decoded. Because of that the reader cannot tell whether more
/// records follow: `truncated` is set whenever exactly `row_cap` records
/// were read, which also flags a file holding exactly `row_cap` records.
pub fn decode(bytes: &[u8], row_cap: usize) -> ViewResult {
    ViewResult::from_outcome(read_table(bytes, row_cap))
}

fn read_table(bytes: &[u8], row_cap: usize) -> Result<ViewResult> {
    let reader = Reader::new(bytes).map_err(avro_error)?;
    let schema = serde_json::to_string_pretty(reader.writer_schema()).map_err(avro_error)?;

    let mut index: Option<ColumnIndex> = None;
    let mut rows = Vec::new();

    for value in reader.take(row_cap) {
        let fields = match value.map_err(avro_error)? {
            Value::Record(fields) => fields,
            other => vec![("value".to_string(), other)],
        };
        let index =
            index.get_or_insert_with(|| ColumnIndex::new(fields.iter().map(|(k, _)| k.clone())));
        let mut row = index.blank_row();
        for (name, value) in fields {
            index.set(&mut row, &name, avro_cell(value));
        }
        rows.push(row);
    }

    let records_read = rows.len();
    let mut table = TableView::new(
        index.map(ColumnIndex::into_columns).unwrap_or_default(),
        row_cap,
    );
    table.truncated = records_read == row_cap;
    table.metadata.insert("schema".to_string(), schema);
    for row in rows {
        table.push_row(row);
    }

    tracing::debug!("Decoded Avro: {} records", records_read);

    Ok(ViewResult::Table(table))
}

fn avro_error(err: impl ToString) -> PreviewError {
    PreviewError::parse("Avro", err)
}

fn avro_cell(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Boolean(b) => Cell::Bool(b),
        Value::Int(i) => Cell::Int(i.into()),
        Value::Long(i) => Cell::Int(i),
        Value::Float(x) => Cell::Float(x.into()),
        Value::Double(x) => Cell::Float(x),
        Value::String(s) => Cell::Text(s),
        Value::Enum(_, symbol) => Cell::Text(symbol),
        Value::Union(_, inner) => avro_cell(*inner),
        other => match serde_json::Value::try_from(other) {
            Ok(serde_json::Value::String(s)) => Cell::Text(s),
            Ok(json) => Cell::Text(json.to_string()),
            Err(e) => Cell::Text(format!("<{e}>")),
        },
    }
}
