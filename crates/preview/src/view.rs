//! The uniform decoded-preview structure returned by every decoder.

use crate::error::{ErrorKind, PreviewError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Format-specific extras (schema text, version, root tag, hints)
pub type Metadata = BTreeMap<String, String>;

/// A single display value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Sentinel for a column the source record did not carry
    pub fn empty() -> Self {
        Cell::Text(String::new())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(x) => write!(f, "{x}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Rows and columns of a tabular preview
///
/// Rows are positional: `rows[r][c]` is the value of `columns[c]`, so every
/// row has exactly one value per declared column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// More records existed than `row_cap`
    pub truncated: bool,
    pub row_cap: usize,
    pub metadata: Metadata,
}

impl TableView {
    pub fn new(columns: Vec<String>, row_cap: usize) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            truncated: false,
            row_cap,
            metadata: Metadata::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn total_rows_emitted(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value of `column` in row `row`
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }
}

/// Raw text preview (plain text, or re-serialized JSON/XML)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextView {
    pub content: String,
    pub truncated: bool,
    /// Byte budget applied, if any was
    pub byte_cap: Option<usize>,
    /// Original size: bytes for raw files, elements for JSON values
    pub size: usize,
    pub metadata: Metadata,
}

/// Hex dump preview of undecodable bytes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HexView {
    pub lines: Vec<String>,
    pub truncated: bool,
    pub byte_cap: usize,
    pub size: usize,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorView {
    pub kind: ErrorKind,
    pub message: String,
}

/// Discriminant of a [`ViewResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Table,
    TableFormatSnapshot,
    RawText,
    RawBinary,
    Error,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewKind::Table => "table",
            ViewKind::TableFormatSnapshot => "delta_table",
            ViewKind::RawText => "raw_text",
            ViewKind::RawBinary => "raw_binary",
            ViewKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// Decoded preview, one variant per representation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewResult {
    Table(TableView),
    #[serde(rename = "delta_table")]
    Snapshot(TableView),
    RawText(TextView),
    RawBinary(HexView),
    Error(ErrorView),
}

impl ViewResult {
    /// Convert a decoder outcome into a view; failures become error views
    pub fn from_outcome(outcome: Result<ViewResult, PreviewError>) -> Self {
        outcome.unwrap_or_else(ViewResult::from)
    }

    pub fn kind(&self) -> ViewKind {
        match self {
            ViewResult::Table(_) => ViewKind::Table,
            ViewResult::Snapshot(_) => ViewKind::TableFormatSnapshot,
            ViewResult::RawText(_) => ViewKind::RawText,
            ViewResult::RawBinary(_) => ViewKind::RawBinary,
            ViewResult::Error(_) => ViewKind::Error,
        }
    }

    /// Tabular payload for `Table` and `Snapshot` views
    pub fn table(&self) -> Option<&TableView> {
        match self {
            ViewResult::Table(t) | ViewResult::Snapshot(t) => Some(t),
            _ => None,
        }
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            ViewResult::Table(t) | ViewResult::Snapshot(t) => Some(&t.metadata),
            ViewResult::RawText(t) => Some(&t.metadata),
            ViewResult::RawBinary(h) => Some(&h.metadata),
            ViewResult::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ViewResult::Error(e) => Some(&e.message),
            _ => None,
        }
    }

    pub fn truncated(&self) -> bool {
        match self {
            ViewResult::Table(t) | ViewResult::Snapshot(t) => t.truncated,
            ViewResult::RawText(t) => t.truncated,
            ViewResult::RawBinary(h) => h.truncated,
            ViewResult::Error(_) => false,
        }
    }

    /// Rows actually placed in the view (zero for non-tabular kinds)
    pub fn total_rows_emitted(&self) -> usize {
        self.table().map_or(0, TableView::total_rows_emitted)
    }
}

impl From<PreviewError> for ViewResult {
    fn from(err: PreviewError) -> Self {
        tracing::warn!("Preview failed: {err}");
        ViewResult::Error(ErrorView {
            kind: err.kind(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> TableView {
        let mut table = TableView::new(vec!["a".to_string(), "b".to_string()], 10);
        table.push_row(vec![Cell::Int(1), Cell::empty()]);
        table.push_row(vec![Cell::Null, Cell::text("x")]);
        table
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Null.to_string(), "");
        assert_eq!(Cell::Int(-3).to_string(), "-3");
        assert_eq!(Cell::Float(2.5).to_string(), "2.5");
        assert_eq!(Cell::Bool(true).to_string(), "true");
        assert_eq!(Cell::text("hi").to_string(), "hi");
    }

    #[test]
    fn test_table_cell_lookup() {
        let table = sample_table();
        assert_eq!(table.cell(0, "a"), Some(&Cell::Int(1)));
        assert_eq!(table.cell(1, "b"), Some(&Cell::text("x")));
        assert_eq!(table.cell(0, "missing"), None);
        assert_eq!(table.cell(5, "a"), None);
        assert_eq!(table.total_rows_emitted(), 2);
    }

    #[test]
    fn test_error_conversion() {
        let view = ViewResult::from_outcome(Err(PreviewError::Encoding("bad byte".into())));
        assert_eq!(view.kind(), ViewKind::Error);
        assert_eq!(
            view.error_message(),
            Some("Error decoding file encoding: bad byte")
        );
        assert!(view.table().is_none());
        assert!(view.metadata().is_none());
        assert_eq!(view.total_rows_emitted(), 0);
    }

    #[test]
    fn test_serialize_is_tagged() {
        let view = ViewResult::Snapshot(sample_table());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["kind"], "delta_table");
        assert_eq!(json["columns"], serde_json::json!(["a", "b"]));
        assert_eq!(json["rows"][0], serde_json::json!([1, ""]));
        assert_eq!(json["rows"][1][0], serde_json::Value::Null);
    }
}
