//! Local directory backend

use crate::{normalize_prefix, sort_entries, ByteSource, Entry, StorageError};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Serves a directory tree as if it were a bucket
///
/// Keys are paths relative to `root`. Keys that would escape the root
/// (`..`, absolute paths) are refused with [`StorageError::AccessDenied`].
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: PathBuf) -> Result<Self> {
        if !root.is_dir() {
            anyhow::bail!("Local source root is not a directory: {}", root.display());
        }
        Ok(Self { root })
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StorageError::AccessDenied(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn map_io_error(err: std::io::Error, key: &str) -> StorageError {
    match err.kind() {
        ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
        ErrorKind::PermissionDenied => StorageError::AccessDenied(key.to_string()),
        _ => StorageError::backend(key, err),
    }
}

#[async_trait]
impl ByteSource for LocalSource {
    async fn list(&self, prefix: &str) -> Result<Vec<Entry>, StorageError> {
        let prefix = normalize_prefix(prefix);
        let dir = self.resolve(&prefix)?;

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| map_io_error(e, &prefix))?;

        let mut results = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| map_io_error(e, &prefix))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| map_io_error(e, &prefix))?;

            if metadata.is_dir() {
                results.push(Entry::folder(format!("{prefix}{name}/")));
            } else if metadata.is_file() {
                let modified = metadata
                    .modified()
                    .ok()
                    .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
                results.push(Entry::file(
                    format!("{prefix}{name}"),
                    metadata.len(),
                    modified,
                ));
            }
        }

        sort_entries(&mut results);

        tracing::debug!(
            "Listed {} entries in directory: {}",
            results.len(),
            dir.display()
        );

        Ok(results)
    }

    async fn get(&self, full_path: &str) -> Result<Bytes, StorageError> {
        let path = self.resolve(full_path)?;
        let contents = tokio::fs::read(&path)
            .await
            .map_err(|e| map_io_error(e, full_path))?;

        tracing::debug!("Read {} bytes from: {}", contents.len(), path.display());

        Ok(Bytes::from(contents))
    }

    async fn get_within(&self, full_path: &str, max_bytes: u64) -> Result<Bytes, StorageError> {
        let path = self.resolve(full_path)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| map_io_error(e, full_path))?;
        StorageError::check_size(full_path, metadata.len(), max_bytes)?;
        self.get(full_path).await
    }

    fn display_name(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntryKind;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, LocalSource) {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("file1.csv"), "a,b\n1,2\n").unwrap();
        std::fs::write(temp_dir.path().join("file2.json"), "[]").unwrap();
        std::fs::create_dir(temp_dir.path().join("subdir")).unwrap();
        std::fs::write(temp_dir.path().join("subdir/nested.xml"), "<r/>").unwrap();
        let source = LocalSource::new(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, source)
    }

    #[tokio::test]
    async fn test_list_root() {
        let (_dir, source) = fixture();
        let entries = source.list("").await.unwrap();

        let paths: Vec<_> = entries.iter().map(|e| e.full_path.as_str()).collect();
        assert_eq!(paths, vec!["subdir/", "file1.csv", "file2.json"]);
        assert_eq!(entries[0].kind, EntryKind::Folder);
        assert_eq!(entries[1].size_bytes, Some(8));
        assert!(entries[1].last_modified.is_some());
    }

    #[tokio::test]
    async fn test_list_subdirectory() {
        let (_dir, source) = fixture();
        let entries = source.list("subdir").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].full_path, "subdir/nested.xml");
        assert_eq!(entries[0].name, "nested.xml");
    }

    #[tokio::test]
    async fn test_get_file() {
        let (_dir, source) = fixture();
        let bytes = source.get("subdir/nested.xml").await.unwrap();
        assert_eq!(&bytes[..], b"<r/>");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_dir, source) = fixture();
        let err = source.get("nope.csv").await.unwrap_err();
        assert_eq!(err, StorageError::NotFound("nope.csv".to_string()));
    }

    #[tokio::test]
    async fn test_get_outside_root_is_denied() {
        let (_dir, source) = fixture();
        let err = source.get("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn test_get_within_checks_size_first() {
        let (_dir, source) = fixture();
        let bytes = source.get_within("file1.csv", 8).await.unwrap();
        assert_eq!(bytes.len(), 8);

        let err = source.get_within("file1.csv", 7).await.unwrap_err();
        assert!(matches!(err, StorageError::TooLarge { size: 8, limit: 7, .. }));

        let err = source.get_within("nope.csv", 7).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let (_dir, source) = fixture();
        let result = source.list("nonexistent/").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_root_must_exist() {
        assert!(LocalSource::new(PathBuf::from("/nonexistent/path")).is_err());
    }
}
