//! Raw text / hex dump decoder for unrecognized files

use crate::truncate::cap_bytes;
use crate::view::{HexView, Metadata, TextView, ViewResult};

/// Bytes rendered in a hex dump, out of the byte-capped slice
pub const HEX_DUMP_BYTES: usize = 1024;

const BYTES_PER_LINE: usize = 16;

/// Width of the hex column: 16 pairs separated by single spaces, plus one
const HEX_COLUMN_WIDTH: usize = BYTES_PER_LINE * 3;

const HTML_MARKERS: &[&str] = &["<html", "<!doctype html"];
const XML_MARKERS: &[&str] = &["<?xml"];
const CODE_MARKERS: &[&str] = &[
    "def ",
    "function ",
    "import ",
    "class ",
    "#include",
    "fn ",
    "package ",
    "#!/",
];

/// Preview the first `byte_cap` bytes as text, or as a hex dump if they
/// are not valid UTF-8. Never produces an error view.
pub fn decode(bytes: &[u8], filename: &str, byte_cap: usize) -> ViewResult {
    let (slice, truncated) = cap_bytes(bytes, byte_cap);

    match capped_text(slice, truncated) {
        Some(text) => {
            let mut metadata = Metadata::new();
            metadata.insert("content_type".to_string(), classify_text(text).to_string());
            metadata.insert("filename".to_string(), filename.to_string());
            ViewResult::RawText(TextView {
                content: text.to_string(),
                truncated,
                byte_cap: Some(byte_cap),
                size: bytes.len(),
                metadata,
            })
        }
        None => {
            let dumped = &slice[..slice.len().min(HEX_DUMP_BYTES)];
            let mut metadata = Metadata::new();
            metadata.insert("content_type".to_string(), "binary".to_string());
            metadata.insert("filename".to_string(), filename.to_string());
            metadata.insert("dump_bytes".to_string(), dumped.len().to_string());
            ViewResult::RawBinary(HexView {
                lines: hex_dump(dumped),
                truncated,
                byte_cap,
                size: bytes.len(),
                metadata,
            })
        }
    }
}

/// UTF-8 view of the slice
///
/// When the byte cap split a multi-byte character, the partial character
/// at the end is dropped instead of treating the whole slice as binary.
fn capped_text(slice: &[u8], truncated: bool) -> Option<&str> {
    match std::str::from_utf8(slice) {
        Ok(text) => Some(text),
        Err(e) if truncated && e.error_len().is_none() => {
            std::str::from_utf8(&slice[..e.valid_up_to()]).ok()
        }
        Err(_) => None,
    }
}

/// Coarse content classification by marker substrings, first match wins
pub fn classify_text(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    let has_any = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    if has_any(HTML_MARKERS) {
        "html"
    } else if has_any(XML_MARKERS) {
        "xml"
    } else if has_any(CODE_MARKERS) {
        "code"
    } else {
        "text"
    }
}

/// Classic 16-bytes-per-line dump: offset, hex pairs, printable ASCII
pub fn hex_dump(bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(BYTES_PER_LINE)
        .enumerate()
        .map(|(line, chunk)| {
            let hex = chunk
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(" ");
            let ascii: String = chunk
                .iter()
                .map(|&b| {
                    if (0x20..=0x7e).contains(&b) {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!(
                "{:08x}  {:<width$}  {}",
                line * BYTES_PER_LINE,
                hex,
                ascii,
                width = HEX_COLUMN_WIDTH
            )
        })
        .collect()
}
