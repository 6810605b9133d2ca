//! In-memory backend

use crate::{normalize_prefix, sort_entries, ByteSource, Entry, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};

/// Objects held in a sorted map, keyed by full path
///
/// Folders are implied by keys containing `/`, exactly like a bucket.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    objects: BTreeMap<String, Bytes>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, bytes: impl Into<Bytes>) {
        self.objects.insert(key.into(), bytes.into());
    }

    pub fn with(mut self, key: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        self.insert(key, bytes);
        self
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    async fn list(&self, prefix: &str) -> Result<Vec<Entry>, StorageError> {
        let prefix = normalize_prefix(prefix);
        let mut folders = BTreeSet::new();
        let mut results = Vec::new();

        for (key, bytes) in self.objects.range(prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                Some((folder, _)) => {
                    folders.insert(format!("{prefix}{folder}/"));
                }
                None if !rest.is_empty() => {
                    results.push(Entry::file(key.clone(), bytes.len() as u64, None));
                }
                None => {}
            }
        }

        results.extend(folders.into_iter().map(Entry::folder));
        sort_entries(&mut results);
        Ok(results)
    }

    async fn get(&self, full_path: &str) -> Result<Bytes, StorageError> {
        self.objects
            .get(full_path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(full_path.to_string()))
    }

    fn display_name(&self) -> String {
        format!("memory ({} objects)", self.objects.len())
    }
}
