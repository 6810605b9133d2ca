//! Flattening helpers shared by the semi-structured decoders.

use crate::error::{PreviewError, Result};
use crate::view::Cell;
use std::collections::{HashMap, HashSet};

/// Column set with name lookup, used to build full-width rows
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn new(columns: impl IntoIterator<Item = String>) -> Self {
        let columns = unique_columns(columns);
        let positions = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { columns, positions }
    }

    pub fn into_columns(self) -> Vec<String> {
        self.columns
    }

    /// Row with the empty sentinel in every column
    pub fn blank_row(&self) -> Vec<Cell> {
        vec![Cell::empty(); self.columns.len()]
    }

    /// Set `column` in `row`; columns outside the set are ignored
    pub fn set(&self, row: &mut [Cell], column: &str, value: Cell) -> bool {
        match self.positions.get(column) {
            Some(&idx) => {
                row[idx] = value;
                true
            }
            None => false,
        }
    }
}

/// Make column names unique, suffixing repeats with `.1`, `.2`, ...
pub fn unique_columns(columns: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for column in columns {
        let mut candidate = column.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{column}.{n}");
            n += 1;
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }
    result
}

/// Decode bytes that must be text, dropping a UTF-8 byte-order mark
pub fn decode_utf8(bytes: &[u8]) -> Result<&str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|e| PreviewError::Encoding(e.to_string()))
}
