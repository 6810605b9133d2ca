//! Plain-text and JSON rendering of listings and preview views

use bucket_peek_file::{Entry, EntryKind};
use bucket_peek_preview::{DetectedFormat, TableView, ViewResult};
use comfy_table::{presets::UTF8_FULL, Table};
use serde_json::json;

/// Metadata keys too large to echo under a table
const HIDDEN_METADATA: &[&str] = &["raw_json"];

/// One line per entry: marker, size, modification time, name
///
/// `/` marks folders and `*` marks files with a tabular preview.
pub fn listing_text(entries: &[Entry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let marker = match entry.kind {
            EntryKind::Folder => '/',
            EntryKind::File if DetectedFormat::classify(&entry.name).is_tabular() => '*',
            EntryKind::File => ' ',
        };
        let size = entry
            .size_bytes
            .map(human_size)
            .unwrap_or_else(|| "-".to_string());
        let modified = entry.last_modified.as_deref().unwrap_or("-");
        out.push_str(&format!(
            "{marker} {size:>10}  {modified:<25}  {}\n",
            entry.full_path
        ));
    }
    out
}

pub fn listing_json(entries: &[Entry]) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = entries
        .iter()
        .map(|e| {
            json!({
                "name": e.name,
                "full_path": e.full_path,
                "kind": if e.is_folder() { "folder" } else { "file" },
                "size_bytes": e.size_bytes,
                "last_modified": e.last_modified,
                "format": (!e.is_folder()).then(|| DetectedFormat::classify(&e.name).to_string()),
            })
        })
        .collect();
    serde_json::Value::Array(entries)
}

/// Render a view for a terminal
///
/// Error views render to their message only; the caller decides where it goes.
pub fn view_text(view: &ViewResult) -> String {
    match view {
        ViewResult::Table(table) | ViewResult::Snapshot(table) => table_text(table),
        ViewResult::RawText(text) => {
            let mut out = text.content.clone();
            if !out.ends_with('\n') {
                out.push('\n');
            }
            if text.truncated {
                if let Some(cap) = text.byte_cap {
                    out.push_str(&format!(
                        "... (showing first {} of {})\n",
                        human_size(cap as u64),
                        human_size(text.size as u64)
                    ));
                }
            }
            out
        }
        ViewResult::RawBinary(hex) => {
            let mut out = hex.lines.join("\n");
            out.push('\n');
            out.push_str(&format!(
                "({} total, binary)\n",
                human_size(hex.size as u64)
            ));
            out
        }
        ViewResult::Error(e) => format!("{}\n", e.message),
    }
}

fn table_text(table: &TableView) -> String {
    let mut grid = Table::new();
    grid.load_preset(UTF8_FULL);
    grid.set_header(&table.columns);
    for row in &table.rows {
        grid.add_row(row.iter().map(|cell| single_line(&cell.to_string())));
    }

    let mut out = grid.to_string();
    out.push('\n');
    if table.truncated {
        out.push_str(&format!(
            "{} rows shown (truncated at {})\n",
            table.rows.len(),
            table.row_cap
        ));
    } else {
        out.push_str(&format!("{} rows\n", table.rows.len()));
    }

    for (key, value) in &table.metadata {
        if HIDDEN_METADATA.contains(&key.as_str()) {
            continue;
        }
        if value.contains('\n') {
            out.push_str(&format!("{key}:\n"));
            for line in value.lines() {
                out.push_str(&format!("  {line}\n"));
            }
        } else {
            out.push_str(&format!("{key}: {value}\n"));
        }
    }
    out
}

fn single_line(value: &str) -> String {
    value.replace('\n', "\\n").replace('\t', " ")
}

/// Byte count with binary units, e.g. `1.5 KiB`
pub fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
