//! Storage-facing entry point: fetch an object, then sniff and decode it.

use crate::config::PreviewConfig;
use crate::decode;
use crate::delta;
use crate::error::PreviewError;
use crate::view::ViewResult;
use bucket_peek_file::{entry_name, ByteSource, Entry, StorageError};
use bytes::Bytes;
use std::sync::Arc;

/// Previews objects of one [`ByteSource`] under one set of budgets
#[derive(Clone)]
pub struct Previewer {
    source: Arc<dyn ByteSource>,
    config: PreviewConfig,
}

impl Previewer {
    pub fn new(source: Arc<dyn ByteSource>, config: PreviewConfig) -> Self {
        Self { source, config }
    }

    /// Sniff and decode bytes that are already in memory
    pub fn preview_bytes(&self, filename: &str, bytes: Bytes) -> ViewResult {
        let limit = self.config.max_object_bytes as u64;
        if bytes.len() as u64 > limit {
            return too_large(filename, bytes.len() as u64, limit);
        }
        decode::decode_file(filename, bytes, &self.config)
    }

    /// Fetch `key` from the source and preview it
    ///
    /// Objects above `max_object_bytes` are refused before their body is read
    /// whenever the backend knows the size up front.
    pub async fn preview_object(&self, key: &str) -> ViewResult {
        tracing::info!("Previewing {} from {}", key, self.source.display_name());

        let limit = self.config.max_object_bytes as u64;
        let bytes = match self.source.get_within(key, limit).await {
            Ok(bytes) => bytes,
            Err(StorageError::TooLarge { size, limit, .. }) => {
                return too_large(entry_name(key), size, limit)
            }
            Err(e) => return PreviewError::Storage(e).into(),
        };

        let view = self.preview_bytes(entry_name(key), bytes);
        tracing::debug!(
            "Preview of {} is {} ({} rows, truncated: {})",
            key,
            view.kind(),
            view.total_rows_emitted(),
            view.truncated()
        );
        view
    }

    /// Preview the Delta table rooted at `path`
    pub async fn preview_snapshot(&self, path: &str) -> ViewResult {
        tracing::info!(
            "Previewing Delta table {} from {}",
            path,
            self.source.display_name()
        );
        delta::decode(self.source.as_ref(), path, &self.config).await
    }

    /// Immediate children of `prefix`
    pub async fn list(&self, prefix: &str) -> Result<Vec<Entry>, StorageError> {
        tracing::debug!("Listing {:?}", prefix);
        self.source.list(prefix).await
    }
}

fn too_large(filename: &str, size: u64, ceiling: u64) -> ViewResult {
    PreviewError::UnsupportedFormat(format!(
        "{filename} is {size} bytes, above the {ceiling} byte preview limit"
    ))
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::view::ViewKind;
    use bucket_peek_file::MemorySource;

    fn previewer(source: MemorySource, config: PreviewConfig) -> Previewer {
        Previewer::new(Arc::new(source), config)
    }

    #[tokio::test]
    async fn test_preview_object_uses_key_name() {
        let source = MemorySource::new().with("data/2024/people.csv", "name,age\nann,31\n");
        let p = previewer(source, PreviewConfig::default());
        let view = p.preview_object("data/2024/people.csv").await;
        let t = view.table().unwrap();
        assert_eq!(t.columns, vec!["name", "age"]);
        assert_eq!(t.cell(0, "age"), Some(&crate::view::Cell::Int(31)));
    }

    #[tokio::test]
    async fn test_missing_object_is_storage_error_view() {
        let p = previewer(MemorySource::new(), PreviewConfig::default());
        match p.preview_object("nope.csv").await {
            ViewResult::Error(e) => {
                assert_eq!(e.kind, ErrorKind::Storage);
                assert!(e.message.contains("nope.csv"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_object_above_ceiling_is_not_decoded() {
        let source = MemorySource::new().with("big.json", vec![b' '; 64]);
        let p = previewer(source, PreviewConfig::default().with_max_object_bytes(16));
        match p.preview_object("big.json").await {
            ViewResult::Error(e) => {
                assert_eq!(e.kind, ErrorKind::UnsupportedFormat);
                assert!(e.message.contains("64 bytes"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_local_object_above_ceiling_is_refused_before_reading() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("wide.csv"), "a,b\n1,2\n3,4\n").unwrap();
        let source = bucket_peek_file::LocalSource::new(dir.path().to_path_buf()).unwrap();
        let p = Previewer::new(
            Arc::new(source),
            PreviewConfig::default().with_max_object_bytes(8),
        );
        match p.preview_object("wide.csv").await {
            ViewResult::Error(e) => {
                assert_eq!(e.kind, ErrorKind::UnsupportedFormat);
                assert_eq!(
                    e.message,
                    "Unsupported file: wide.csv is 12 bytes, above the 8 byte preview limit"
                );
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_preview_bytes_dispatch() {
        let p = previewer(MemorySource::new(), PreviewConfig::default().with_byte_cap(5));
        let view = p.preview_bytes("notes", Bytes::from_static(b"hello world"));
        assert_eq!(view.kind(), ViewKind::RawText);
        assert!(view.truncated());
    }

    #[tokio::test]
    async fn test_list_passes_through() {
        let source = MemorySource::new()
            .with("a/x.csv", "x")
            .with("b.json", "{}");
        let p = previewer(source, PreviewConfig::default());
        let names: Vec<String> = p
            .list("")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a", "b.json"]);
    }
}
