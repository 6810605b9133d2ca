//! JSON decoder and flattening rules
//!
//! The top-level shape decides the view:
//!
//! - array of objects: table over the union of keys of every element
//! - single object: two-column key/value table
//! - anything else: pretty-printed raw view

use crate::error::{PreviewError, Result};
use crate::normalize::{decode_utf8, ColumnIndex};
use crate::truncate::RowBudget;
use crate::view::{Cell, Metadata, TableView, TextView, ViewResult};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Elements kept verbatim in `raw_json` for array-of-objects previews
pub const RAW_JSON_ELEMENT_CAP: usize = 100;

pub fn decode(bytes: &[u8], row_cap: usize) -> ViewResult {
    ViewResult::from_outcome(read_document(bytes, row_cap))
}

fn read_document(bytes: &[u8], row_cap: usize) -> Result<ViewResult> {
    let text = decode_utf8(bytes)?;
    let document: Value =
        serde_json::from_str(text).map_err(|e| PreviewError::parse("JSON", e))?;

    match document {
        Value::Array(items) if is_record_list(&items) => records_table(&items, row_cap),
        Value::Array(items) => {
            let size = items.len();
            raw_view(&Value::Array(items), size)
        }
        Value::Object(object) => key_value_table(&object, row_cap),
        primitive => raw_view(&primitive, 1),
    }
}

fn is_record_list(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(Value::is_object)
}

/// Table over an array of objects
///
/// Columns are the sorted union of keys across all elements, not only the
/// displayed ones, so headers stay correct when rows are cut.
fn records_table(items: &[Value], row_cap: usize) -> Result<ViewResult> {
    let keys: BTreeSet<&String> = items
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|object| object.keys())
        .collect();
    let index = ColumnIndex::new(keys.into_iter().cloned());

    let mut budget = RowBudget::new(row_cap);
    let mut rows = Vec::new();
    for object in items.iter().filter_map(Value::as_object) {
        if !budget.admit() {
            continue;
        }
        let mut row = index.blank_row();
        for (key, value) in object {
            index.set(&mut row, key, json_cell(value));
        }
        rows.push(row);
    }

    let head = &items[..items.len().min(RAW_JSON_ELEMENT_CAP)];
    let raw = serde_json::to_string_pretty(head).map_err(|e| PreviewError::parse("JSON", e))?;

    let mut table = TableView::new(index.into_columns(), row_cap);
    table.truncated = budget.truncated();
    table.metadata.insert("raw_json".to_string(), raw);
    table
        .metadata
        .insert("total_elements".to_string(), items.len().to_string());
    for row in rows {
        table.push_row(row);
    }

    Ok(ViewResult::Table(table))
}

/// Two-column view of a single object, keys in document order
fn key_value_table(object: &Map<String, Value>, row_cap: usize) -> Result<ViewResult> {
    let mut table = TableView::new(vec!["key".to_string(), "value".to_string()], row_cap);
    let mut budget = RowBudget::new(row_cap);

    for (key, value) in object {
        if budget.admit() {
            table.push_row(vec![Cell::text(key.as_str()), json_cell(value)]);
        }
    }

    let raw = serde_json::to_string_pretty(object).map_err(|e| PreviewError::parse("JSON", e))?;
    table.truncated = budget.truncated();
    table.metadata.insert("raw_json".to_string(), raw);

    Ok(ViewResult::Table(table))
}

fn raw_view(value: &Value, size: usize) -> Result<ViewResult> {
    let content =
        serde_json::to_string_pretty(value).map_err(|e| PreviewError::parse("JSON", e))?;
    let mut metadata = Metadata::new();
    metadata.insert("format".to_string(), "json_raw".to_string());

    Ok(ViewResult::RawText(TextView {
        content,
        truncated: false,
        byte_cap: None,
        size,
        metadata,
    }))
}

/// Scalars keep their type; arrays and objects are re-serialized inline
fn json_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Int(i)
            } else if let Some(f) = n.as_f64().filter(|_| n.is_f64()) {
                Cell::Float(f)
            } else {
                Cell::Text(n.to_string())
            }
        }
        Value::String(s) => Cell::text(s.as_str()),
        structured => Cell::Text(structured.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::view::ViewKind;

    fn table(view: &ViewResult) -> &TableView {
        view.table().expect("expected a table view")
    }

    #[test]
    fn test_union_of_keys_across_all_elements() {
        let data = br#"[{"a":1},{"b":2},{"a":3,"c":4}]"#;
        let view = decode(data, 2);
        let t = table(&view);
        assert_eq!(t.columns, vec!["a", "b", "c"]);
        assert_eq!(t.total_rows_emitted(), 2);
        assert!(t.truncated);
        assert_eq!(t.rows[0], vec![Cell::Int(1), Cell::empty(), Cell::empty()]);
        assert_eq!(t.rows[1], vec![Cell::empty(), Cell::Int(2), Cell::empty()]);
    }

    #[test]
    fn test_records_under_cap() {
        let data = br#"[{"id":1,"name":"x","nested":{"k":[1,2]}},{"id":2,"name":null}]"#;
        let view = decode(data, 10);
        let t = table(&view);
        assert!(!t.truncated);
        assert_eq!(t.total_rows_emitted(), 2);
        assert_eq!(t.columns, vec!["id", "name", "nested"]);
        assert_eq!(t.cell(0, "nested"), Some(&Cell::text(r#"{"k":[1,2]}"#)));
        assert_eq!(t.cell(1, "name"), Some(&Cell::Null));
        assert_eq!(t.cell(1, "nested"), Some(&Cell::empty()));
    }

    #[test]
    fn test_raw_json_is_capped_at_one_hundred_elements() {
        let items: Vec<String> = (0..150).map(|i| format!(r#"{{"i":{i}}}"#)).collect();
        let data = format!("[{}]", items.join(","));
        let view = decode(data.as_bytes(), 10);
        let t = table(&view);
        assert_eq!(t.total_rows_emitted(), 10);
        let raw: Vec<Value> = serde_json::from_str(&t.metadata["raw_json"]).unwrap();
        assert_eq!(raw.len(), RAW_JSON_ELEMENT_CAP);
        assert_eq!(t.metadata["total_elements"], "150");
    }

    #[test]
    fn test_array_of_scalars_is_raw() {
        let view = decode(b"[1, \"two\", null]", 1);
        match view {
            ViewResult::RawText(text) => {
                assert_eq!(text.metadata["format"], "json_raw");
                assert_eq!(text.size, 3);
                assert!(!text.truncated);
                assert!(text.content.contains("\"two\""));
            }
            other => panic!("expected raw view, got {other:?}"),
        }
    }

    #[test]
    fn test_mixed_array_is_raw() {
        let view = decode(br#"[{"a":1}, 2]"#, 10);
        assert_eq!(view.kind(), ViewKind::RawText);
    }

    #[test]
    fn test_empty_array_is_raw() {
        let view = decode(b"[]", 10);
        assert_eq!(view.kind(), ViewKind::RawText);
    }

    #[test]
    fn test_single_object_key_value() {
        let data = br#"{"zeta": 1, "alpha": {"x": true}, "mid": "s"}"#;
        let view = decode(data, 2);
        let t = table(&view);
        assert_eq!(t.columns, vec!["key", "value"]);
        assert_eq!(t.total_rows_emitted(), 2);
        assert!(t.truncated);
        assert_eq!(t.rows[0], vec![Cell::text("zeta"), Cell::Int(1)]);
        assert_eq!(
            t.rows[1],
            vec![Cell::text("alpha"), Cell::text(r#"{"x":true}"#)]
        );
        let raw: Value = serde_json::from_str(&t.metadata["raw_json"]).unwrap();
        assert_eq!(raw["mid"], "s");
    }

    #[test]
    fn test_primitive() {
        let view = decode(b"42", 10);
        match view {
            ViewResult::RawText(text) => {
                assert_eq!(text.content, "42");
                assert_eq!(text.size, 1);
            }
            other => panic!("expected raw view, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_brace_is_parse_error() {
        let view = decode(br#"{"a": [1, 2"#, 10);
        match &view {
            ViewResult::Error(e) => {
                assert_eq!(e.kind, ErrorKind::Parse);
                assert!(e.message.starts_with("Error reading JSON"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_encoding_is_encoding_error() {
        let view = decode(b"[\"\xff\"]", 10);
        match &view {
            ViewResult::Error(e) => assert_eq!(e.kind, ErrorKind::Encoding),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_float_and_big_numbers() {
        assert_eq!(json_cell(&serde_json::json!(1.25)), Cell::Float(1.25));
        assert_eq!(
            json_cell(&serde_json::json!(u64::MAX)),
            Cell::Text(u64::MAX.to_string())
        );
    }
}
