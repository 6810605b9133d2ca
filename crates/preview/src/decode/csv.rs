//! Delimited text decoder

use crate::error::{PreviewError, Result};
use crate::normalize::unique_columns;
use crate::truncate::RowBudget;
use crate::view::{Cell, TableView, ViewResult};

/// Decode a comma-separated file with a header row
pub fn decode(bytes: &[u8], row_cap: usize) -> ViewResult {
    ViewResult::from_outcome(read_table(bytes, row_cap))
}

fn read_table(bytes: &[u8], row_cap: usize) -> Result<ViewResult> {
    check_quotes(bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.is_empty() {
        return Err(PreviewError::parse("CSV", "No columns to parse from file"));
    }
    let columns = unique_columns(headers.iter().map(str::to_string));

    let mut table = TableView::new(columns, row_cap);
    let mut budget = RowBudget::new(row_cap);
    let mut record = csv::StringRecord::new();

    while reader.read_record(&mut record).map_err(csv_error)? {
        if budget.admit() {
            table.push_row(record.iter().map(infer_cell).collect());
        }
    }

    table.truncated = budget.truncated();

    tracing::debug!(
        "Decoded CSV: {} columns, {} of {} rows",
        table.columns.len(),
        table.total_rows_emitted(),
        budget.seen()
    );

    Ok(ViewResult::Table(table))
}

fn csv_error(err: csv::Error) -> PreviewError {
    match err.kind() {
        csv::ErrorKind::Utf8 { .. } => PreviewError::Encoding(err.to_string()),
        _ => PreviewError::parse("CSV", err),
    }
}

/// Reject input whose final quoted field never closes.
///
/// The csv reader accepts an open quote at EOF and swallows the rest of the
/// file into one field; this walks the same field states and fails instead.
fn check_quotes(bytes: &[u8]) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        FieldStart,
        Unquoted,
        Quoted,
        QuoteInQuoted,
    }

    let mut state = State::FieldStart;
    let mut line = 1usize;
    let mut opened_at = 0usize;

    for &b in bytes {
        if b == b'\n' && state != State::Quoted {
            line += 1;
        }
        let terminator = matches!(b, b',' | b'\n' | b'\r');
        state = match (state, b) {
            (State::FieldStart, b'"') => {
                opened_at = line;
                State::Quoted
            }
            (State::Quoted, b'"') => State::QuoteInQuoted,
            (State::Quoted, b'\n') => {
                line += 1;
                State::Quoted
            }
            (State::Quoted, _) => State::Quoted,
            (State::QuoteInQuoted, b'"') => State::Quoted,
            (_, _) if terminator => State::FieldStart,
            _ => State::Unquoted,
        };
    }

    if state == State::Quoted {
        return Err(PreviewError::parse(
            "CSV",
            format!("unterminated quoted field starting on line {opened_at}"),
        ));
    }
    Ok(())
}

/// Best-effort typing of a CSV field for display
fn infer_cell(value: &str) -> Cell {
    if value.is_empty() {
        return Cell::Null;
    }
    if let Ok(i) = value.parse::<i64>() {
        return Cell::Int(i);
    }
    if value.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(f) = value.parse::<f64>() {
            return Cell::Float(f);
        }
    }
    match value.to_ascii_lowercase().as_str() {
        "true" => Cell::Bool(true),
        "false" => Cell::Bool(false),
        _ => Cell::text(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::view::ViewKind;

    const USERS: &str = "id,name,age,active
1,Alice,30,true
2,Bob,25,false
3,Charlie,35.5,true
4,Diana,,false
5,Eve,32,true";

    fn table(view: &ViewResult) -> &TableView {
        view.table().expect("expected a table view")
    }

    #[test]
    fn test_under_cap() {
        let view = decode(USERS.as_bytes(), 10);
        let t = table(&view);
        assert_eq!(t.columns, vec!["id", "name", "age", "active"]);
        assert_eq!(t.total_rows_emitted(), 5);
        assert!(!t.truncated);
        assert_eq!(t.row_cap, 10);
    }

    #[test]
    fn test_exactly_cap() {
        let view = decode(USERS.as_bytes(), 5);
        assert!(!view.truncated());
        assert_eq!(view.total_rows_emitted(), 5);
    }

    #[test]
    fn test_over_cap() {
        let view = decode(USERS.as_bytes(), 2);
        let t = table(&view);
        assert!(t.truncated);
        assert_eq!(t.total_rows_emitted(), 2);
        assert_eq!(t.cell(1, "name"), Some(&Cell::text("Bob")));
    }

    #[test]
    fn test_cell_typing() {
        let view = decode(USERS.as_bytes(), 10);
        let t = table(&view);
        assert_eq!(t.cell(0, "id"), Some(&Cell::Int(1)));
        assert_eq!(t.cell(2, "age"), Some(&Cell::Float(35.5)));
        assert_eq!(t.cell(3, "age"), Some(&Cell::Null));
        assert_eq!(t.cell(1, "active"), Some(&Cell::Bool(false)));
    }

    #[test]
    fn test_quoted_fields_with_delimiters_and_newlines() {
        let data = "k,v\n\"a,b\",\"line1\nline2\"\n\"say \"\"hi\"\"\",x\n";
        let view = decode(data.as_bytes(), 10);
        let t = table(&view);
        assert_eq!(t.cell(0, "k"), Some(&Cell::text("a,b")));
        assert_eq!(t.cell(0, "v"), Some(&Cell::text("line1\nline2")));
        assert_eq!(t.cell(1, "k"), Some(&Cell::text("say \"hi\"")));
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        let data = "a,b\n1,\"2\n3,4\n";
        let view = decode(data.as_bytes(), 10);
        assert_eq!(view.kind(), ViewKind::Error);
        let message = view.error_message().unwrap();
        assert!(message.starts_with("Error reading CSV"));
        assert!(message.contains("unterminated quoted field starting on line 2"));
    }

    #[test]
    fn test_ragged_row_is_error() {
        let data = "a,b\n1,2\n3,4,5\n";
        let view = decode(data.as_bytes(), 10);
        assert_eq!(view.kind(), ViewKind::Error);
        assert!(!view.error_message().unwrap().is_empty());
    }

    #[test]
    fn test_empty_input_is_error() {
        let view = decode(b"", 10);
        assert_eq!(view.kind(), ViewKind::Error);
    }

    #[test]
    fn test_invalid_utf8_is_encoding_error() {
        let view = decode(b"a,b\n\xff\xfe,1\n", 10);
        match view {
            ViewResult::Error(e) => assert_eq!(e.kind, ErrorKind::Encoding),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_headers_are_suffixed() {
        let view = decode(b"x,x,y\n1,2,3\n", 10);
        assert_eq!(table(&view).columns, vec!["x", "x.1", "y"]);
    }

    #[test]
    fn test_header_only() {
        let view = decode(b"a,b\n", 10);
        let t = table(&view);
        assert_eq!(t.columns, vec!["a", "b"]);
        assert_eq!(t.total_rows_emitted(), 0);
        assert!(!t.truncated);
    }

    #[test]
    fn test_infer_cell_keeps_words() {
        assert_eq!(infer_cell("nan"), Cell::text("nan"));
        assert_eq!(infer_cell("inf"), Cell::text("inf"));
        assert_eq!(infer_cell("TRUE"), Cell::Bool(true));
        assert_eq!(infer_cell("1e3"), Cell::Float(1000.0));
    }
}
