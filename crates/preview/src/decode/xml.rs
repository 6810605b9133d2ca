//! XML decoder and flattening rules

use crate::error::{PreviewError, Result};
use crate::normalize::{decode_utf8, ColumnIndex};
use crate::truncate::RowBudget;
use crate::view::{Cell, Metadata, TableView, TextView, ViewResult};
use roxmltree::{Document, Node, ParsingOptions};
use std::collections::BTreeSet;

/// Leading children that must share a tag for the record-list reading
const HOMOGENEITY_SAMPLE: usize = 10;

/// Children scanned for column discovery
///
/// Columns that first appear after this many children are not shown. The
/// bound keeps discovery cheap on very long feeds.
const COLUMN_SAMPLE: usize = 50;

pub fn decode(bytes: &[u8], row_cap: usize) -> ViewResult {
    ViewResult::from_outcome(read_document(bytes, row_cap))
}

fn read_document(bytes: &[u8], row_cap: usize) -> Result<ViewResult> {
    let text = decode_utf8(bytes)?;
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document =
        Document::parse_with_options(text, options).map_err(|e| PreviewError::parse("XML", e))?;

    let root = document.root_element();
    let children: Vec<Node> = root.children().filter(Node::is_element).collect();

    match record_tag(&children) {
        Some(tag) => Ok(records_table(root, &children, tag, row_cap)),
        None => Ok(raw_view(text, root, &children)),
    }
}

/// Tag shared by the leading children, if they look like a record list
fn record_tag<'a>(children: &[Node<'a, '_>]) -> Option<&'a str> {
    let first = children.first()?.tag_name().name();
    children
        .iter()
        .take(HOMOGENEITY_SAMPLE)
        .all(|c| c.tag_name().name() == first)
        .then_some(first)
}

/// Trimmed text of an element, if it has any
fn element_text<'a>(node: &Node<'a, '_>) -> Option<&'a str> {
    node.text().map(str::trim).filter(|t| !t.is_empty())
}

fn sub_elements<'a, 'input>(node: &Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

fn discover_columns(children: &[Node]) -> ColumnIndex {
    let mut columns = BTreeSet::new();
    for child in children.iter().take(COLUMN_SAMPLE) {
        for attr in child.attributes() {
            columns.insert(format!("@{}", attr.name()));
        }
        for sub in sub_elements(child) {
            let tag = sub.tag_name().name();
            if element_text(&sub).is_some() {
                columns.insert(tag.to_string());
            }
            for attr in sub.attributes() {
                columns.insert(format!("{tag}@{}", attr.name()));
            }
        }
    }
    ColumnIndex::new(columns)
}

fn records_table(root: Node, children: &[Node], tag: &str, row_cap: usize) -> ViewResult {
    let index = discover_columns(children);
    let mut budget = RowBudget::new(row_cap);
    let mut rows = Vec::new();

    for child in children {
        if !budget.admit() {
            continue;
        }
        let mut row = index.blank_row();
        for attr in child.attributes() {
            index.set(&mut row, &format!("@{}", attr.name()), Cell::text(attr.value()));
        }
        for sub in sub_elements(child) {
            let sub_tag = sub.tag_name().name();
            if let Some(text) = element_text(&sub) {
                index.set(&mut row, sub_tag, Cell::text(text));
            }
            for attr in sub.attributes() {
                index.set(
                    &mut row,
                    &format!("{sub_tag}@{}", attr.name()),
                    Cell::text(attr.value()),
                );
            }
        }
        rows.push(row);
    }

    let mut table = TableView::new(index.into_columns(), row_cap);
    table.truncated = budget.truncated();
    table
        .metadata
        .insert("root_tag".to_string(), root.tag_name().name().to_string());
    table
        .metadata
        .insert("total_children".to_string(), children.len().to_string());
    table
        .metadata
        .insert("record_tag".to_string(), tag.to_string());
    for row in rows {
        table.push_row(row);
    }

    tracing::debug!(
        "Decoded XML records <{}>: {} columns, {} of {} rows",
        tag,
        table.columns.len(),
        table.total_rows_emitted(),
        children.len()
    );

    ViewResult::Table(table)
}

fn raw_view(text: &str, root: Node, children: &[Node]) -> ViewResult {
    let structure = if children.is_empty() { "simple" } else { "mixed" };

    let mut metadata = Metadata::new();
    metadata.insert("format".to_string(), "xml_raw".to_string());
    metadata.insert("root_tag".to_string(), root.tag_name().name().to_string());
    metadata.insert("children".to_string(), children.len().to_string());
    metadata.insert("structure".to_string(), structure.to_string());

    ViewResult::RawText(TextView {
        content: text.to_string(),
        truncated: false,
        byte_cap: None,
        size: text.len(),
        metadata,
    })
}
