//! Format detection and bounded tabular previews for stored objects
//!
//! Given a filename and its bytes, this crate decides which decoder applies
//! and turns the bytes into a [`ViewResult`]: a table, a raw text view, a
//! hex dump, or an error message. Every view is bounded by the budgets in
//! [`PreviewConfig`], so a multi-gigabyte object never becomes a
//! multi-gigabyte preview.
//!
//! # Supported Formats
//!
//! - **CSV**: header row plus typed cells
//! - **Parquet**: first rows plus the arrow schema
//! - **Avro**: object container files, columns from the first record
//! - **JSON**: arrays of objects, single objects, or raw values
//! - **XML**: homogeneous record lists, otherwise raw text
//! - **Delta Lake**: table snapshots replayed from `_delta_log/`
//! - anything else: text or hex dump of the first bytes
//!
//! # Example
//!
//! ```ignore
//! use bucket_peek_preview::{Previewer, PreviewConfig};
//!
//! let previewer = Previewer::new(source, PreviewConfig::default());
//! let view = previewer.preview_object("data/users.parquet").await;
//! if let Some(table) = view.table() {
//!     println!("{} columns, {} rows", table.columns.len(), table.rows.len());
//! }
//! ```

pub mod config;
pub mod decode;
pub mod delta;
pub mod error;
pub mod format;
pub mod normalize;
pub mod previewer;
pub mod truncate;
pub mod view;

pub use config::PreviewConfig;
pub use error::{ErrorKind, PreviewError};
pub use format::DetectedFormat;
pub use previewer::Previewer;
pub use view::{Cell, ErrorView, HexView, Metadata, TableView, TextView, ViewKind, ViewResult};
