//! Transaction log replay

use crate::decode::parquet as parquet_decoder;
use crate::error::{PreviewError, Result};
use bucket_peek_file::{ByteSource, EntryKind, StorageError};
use bytes::Bytes;
use parquet::file::reader::{FileReader, SerializedFileReader};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

pub const LOG_DIR: &str = "_delta_log";
pub const DELTA_FORMAT: &str = "Delta table";
const LAST_CHECKPOINT: &str = "_last_checkpoint";

/// One line of a commit file (or one row of a checkpoint)
///
/// Exactly one field is set per action; unknown actions (`protocol`,
/// `commitInfo`, `txn`, ...) deserialize to all-`None` and are skipped.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Action {
    add: Option<AddAction>,
    remove: Option<RemoveAction>,
    meta_data: Option<MetaDataAction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddAction {
    path: String,
    /// Absent or null in checkpoints of unpartitioned tables
    partition_values: Option<HashMap<String, Option<String>>>,
    /// JSON-encoded statistics, when the writer recorded them
    stats: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoveAction {
    path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetaDataAction {
    schema_string: String,
    partition_columns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileStats {
    num_records: Option<u64>,
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
struct LastCheckpoint {
    version: u64,
    parts: Option<u64>,
}

/// A live data file of the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    /// Path relative to the table root, percent-decoded
    pub path: String,
    pub partition_values: BTreeMap<String, Option<String>>,
    /// Row count from the writer's statistics, if present
    pub num_records: Option<u64>,
}

/// Table state after replaying the log up to `version`
#[derive(Debug, Default)]
pub struct Snapshot {
    pub version: Option<u64>,
    pub files: BTreeMap<String, DataFile>,
    pub schema_string: Option<String>,
    pub partition_columns: Vec<String>,
}

impl Snapshot {
    /// Replay the log found under `table_root` (which ends with `/`)
    ///
    /// Checkpoint parts larger than `max_object_bytes` are refused.
    pub async fn load(
        source: &dyn ByteSource,
        table_root: &str,
        max_object_bytes: u64,
    ) -> Result<Self> {
        let log_prefix = format!("{table_root}{LOG_DIR}/");
        let entries = source.list(&log_prefix).await?;
        let files: Vec<_> = entries
            .iter()
            .filter(|e| e.kind == EntryKind::File)
            .collect();

        let mut commits: Vec<(u64, String)> = files
            .iter()
            .filter_map(|e| commit_version(&e.name).map(|v| (v, e.full_path.clone())))
            .collect();
        commits.sort();

        let mut snapshot = Snapshot::default();

        let checkpoint = match read_last_checkpoint(source, &log_prefix).await? {
            Some(hint) => Some(hint),
            None => newest_listed_checkpoint(files.iter().map(|e| e.name.as_str())),
        };
        if let Some(hint) = checkpoint {
            for part in checkpoint_files(&log_prefix, &hint) {
                let bytes = source.get_within(&part, max_object_bytes).await?;
                snapshot.apply_checkpoint(bytes)?;
            }
            snapshot.version = Some(hint.version);
            tracing::debug!(
                "Loaded Delta checkpoint at version {} ({} part(s))",
                hint.version,
                hint.parts.unwrap_or(1)
            );
        }

        for (version, path) in commits {
            if snapshot.version.is_some_and(|v| version <= v) {
                continue;
            }
            let bytes = source.get(&path).await?;
            let text = std::str::from_utf8(&bytes)
                .map_err(|e| PreviewError::Encoding(format!("{path}: {e}")))?;
            snapshot.apply_commit(version, text)?;
        }

        if snapshot.version.is_none() {
            return Err(delta_error(format!(
                "no Delta transaction log found at {log_prefix}"
            )));
        }

        tracing::debug!(
            "Replayed Delta log at {}: version {:?}, {} live files",
            table_root,
            snapshot.version,
            snapshot.files.len()
        );

        Ok(snapshot)
    }

    /// Apply one newline-delimited JSON commit
    pub fn apply_commit(&mut self, version: u64, text: &str) -> Result<()> {
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let action: Action = serde_json::from_str(line).map_err(|e| {
                delta_error(format!("commit {version} line {}: {e}", line_no + 1))
            })?;
            self.apply(action)?;
        }
        self.version = Some(version);
        Ok(())
    }

    /// Apply every action row of a parquet checkpoint part
    fn apply_checkpoint(&mut self, bytes: Bytes) -> Result<()> {
        let reader = SerializedFileReader::new(bytes).map_err(delta_error)?;
        let rows = reader.get_row_iter(None).map_err(delta_error)?;
        for row in rows {
            let row = row.map_err(delta_error)?;
            let action: Action = serde_json::from_value(row.to_json_value())
                .map_err(|e| delta_error(format!("checkpoint row: {e}")))?;
            self.apply(action)?;
        }
        Ok(())
    }

    fn apply(&mut self, action: Action) -> Result<()> {
        if let Some(add) = action.add {
            let path = decode_path(&add.path)?;
            let num_records = add
                .stats
                .as_deref()
                .and_then(|s| serde_json::from_str::<FileStats>(s).ok())
                .and_then(|s| s.num_records);
            let partition_values = add.partition_values.unwrap_or_default();
            self.files.insert(
                path.clone(),
                DataFile {
                    path,
                    partition_values: partition_values.into_iter().collect(),
                    num_records,
                },
            );
        }
        if let Some(remove) = action.remove {
            self.files.remove(&decode_path(&remove.path)?);
        }
        if let Some(meta) = action.meta_data {
            self.schema_string = Some(meta.schema_string);
            self.partition_columns = meta.partition_columns.unwrap_or_default();
        }
        Ok(())
    }
}

pub(crate) fn delta_error(err: impl ToString) -> PreviewError {
    PreviewError::parse(DELTA_FORMAT, err)
}

/// Version of a `00000000000000000003.json` commit file name
fn commit_version(name: &str) -> Option<u64> {
    fixed_width_number(name.strip_suffix(".json")?, 20)
}

/// `_last_checkpoint` is fetched directly; the listing may not reach it
async fn read_last_checkpoint(
    source: &dyn ByteSource,
    log_prefix: &str,
) -> Result<Option<LastCheckpoint>> {
    match source.get(&format!("{log_prefix}{LAST_CHECKPOINT}")).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| delta_error(format!("invalid {LAST_CHECKPOINT}: {e}"))),
        Err(StorageError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// `(version, parts)` of a checkpoint file name; single-part files have one part
///
/// Accepts `{version:020}.checkpoint.parquet` and
/// `{version:020}.checkpoint.{part:010}.{parts:010}.parquet`.
fn checkpoint_part(name: &str) -> Option<(u64, u64)> {
    let stem = name.strip_suffix(".parquet")?;
    let (version, rest) = stem.split_once(".checkpoint")?;
    let version = fixed_width_number(version, 20)?;
    if rest.is_empty() {
        return Some((version, 1));
    }
    let (part, parts) = rest.strip_prefix('.')?.split_once('.')?;
    let part = fixed_width_number(part, 10)?;
    let parts = fixed_width_number(parts, 10)?;
    (1..=parts).contains(&part).then_some((version, parts))
}

fn fixed_width_number(digits: &str, width: usize) -> Option<u64> {
    if digits.len() != width || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Newest checkpoint whose parts are all present among `names`
fn newest_listed_checkpoint<'a>(names: impl Iterator<Item = &'a str>) -> Option<LastCheckpoint> {
    let mut seen: BTreeMap<(u64, u64), u64> = BTreeMap::new();
    for (version, parts) in names.filter_map(checkpoint_part) {
        *seen.entry((version, parts)).or_default() += 1;
    }
    seen.into_iter()
        .rev()
        .find(|((_, parts), count)| count == parts)
        .map(|((version, parts), _)| LastCheckpoint {
            version,
            parts: (parts > 1).then_some(parts),
        })
}

/// Object keys of a checkpoint
fn checkpoint_files(log_prefix: &str, hint: &LastCheckpoint) -> Vec<String> {
    match hint.parts {
        Some(parts) if parts > 1 => (1..=parts)
            .map(|part| {
                format!(
                    "{log_prefix}{:020}.checkpoint.{:010}.{:010}.parquet",
                    hint.version, part, parts
                )
            })
            .collect(),
        _ => vec![format!("{log_prefix}{:020}.checkpoint.parquet", hint.version)],
    }
}

/// Log paths are URI-encoded relative paths
fn decode_path(path: &str) -> Result<String> {
    urlencoding::decode(path)
        .map(|p| p.into_owned())
        .map_err(|e| delta_error(format!("invalid data file path {path}: {e}")))
}

/// Row count of a data file: writer statistics when present, else the footer
pub(crate) async fn data_file_rows(
    source: &dyn ByteSource,
    table_root: &str,
    file: &DataFile,
    max_object_bytes: u64,
) -> Result<usize> {
    if let Some(n) = file.num_records {
        return Ok(n as usize);
    }
    let key = format!("{table_root}{}", file.path);
    let bytes = source.get_within(&key, max_object_bytes).await?;
    parquet_decoder::row_count(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROTOCOL: &str = r#"{"protocol":{"minReaderVersion":1,"minWriterVersion":2}}"#;
    const META: &str = concat!(
        r#"{"metaData":{"id":"t","format":{"provider":"parquet","options":{}},"#,
        r#""schemaString":"{\"type\":\"struct\",\"fields\":[]}","#,
        r#""partitionColumns":["day"],"configuration":{}}}"#
    );

    #[test]
    fn test_commit_version() {
        assert_eq!(commit_version("00000000000000000000.json"), Some(0));
        assert_eq!(commit_version("00000000000000000012.json"), Some(12));
        assert_eq!(commit_version("00000000000000000012.crc"), None);
        assert_eq!(commit_version("_last_checkpoint"), None);
        assert_eq!(commit_version("12.json"), None);
    }

    #[test]
    fn test_add_then_remove() {
        let mut snapshot = Snapshot::default();
        let add_a = concat!(
            r#"{"add":{"path":"day=2024-01-01/a.parquet","#,
            r#""partitionValues":{"day":"2024-01-01"},"size":1,"modificationTime":0,"#,
            r#""dataChange":true,"stats":"{\"numRecords\":3}"}}"#
        );
        let add_b = concat!(
            r#"{"add":{"path":"b%20c.parquet","partitionValues":{},"size":1,"#,
            r#""modificationTime":0,"dataChange":true}}"#
        );
        let commit0 = format!("{PROTOCOL}\n{META}\n{add_a}\n{add_b}\n");
        snapshot.apply_commit(0, &commit0).unwrap();
        assert_eq!(snapshot.files.len(), 2);
        assert_eq!(snapshot.partition_columns, vec!["day"]);
        let a = &snapshot.files["day=2024-01-01/a.parquet"];
        assert_eq!(a.num_records, Some(3));
        assert_eq!(
            a.partition_values.get("day"),
            Some(&Some("2024-01-01".to_string()))
        );
        assert!(snapshot.files.contains_key("b c.parquet"));

        let commit1 = r#"{"commitInfo":{"operation":"DELETE"}}
{"remove":{"path":"b%20c.parquet","deletionTimestamp":1,"dataChange":true}}"#;
        snapshot.apply_commit(1, commit1).unwrap();
        assert_eq!(snapshot.version, Some(1));
        assert_eq!(snapshot.files.len(), 1);
    }

    #[test]
    fn test_bad_commit_line_is_error() {
        let mut snapshot = Snapshot::default();
        let err = snapshot.apply_commit(4, "{\"add\":").unwrap_err();
        assert!(err.to_string().contains("commit 4 line 1"));
    }

    #[test]
    fn test_checkpoint_part_names() {
        assert_eq!(
            checkpoint_part("00000000000000000010.checkpoint.parquet"),
            Some((10, 1))
        );
        assert_eq!(
            checkpoint_part("00000000000000000010.checkpoint.0000000002.0000000003.parquet"),
            Some((10, 3))
        );
        assert_eq!(
            checkpoint_part("00000000000000000010.checkpoint.0000000004.0000000003.parquet"),
            None
        );
        assert_eq!(checkpoint_part("00000000000000000010.json"), None);
        assert_eq!(checkpoint_part("10.checkpoint.parquet"), None);
    }

    #[test]
    fn test_newest_listed_checkpoint_skips_incomplete_sets() {
        let names = [
            "00000000000000000005.checkpoint.parquet",
            "00000000000000000010.checkpoint.0000000001.0000000002.parquet",
            "00000000000000000010.checkpoint.0000000002.0000000002.parquet",
            "00000000000000000020.checkpoint.0000000001.0000000002.parquet",
            "00000000000000000021.json",
        ];
        assert_eq!(
            newest_listed_checkpoint(names.into_iter()),
            Some(LastCheckpoint {
                version: 10,
                parts: Some(2)
            })
        );
        assert_eq!(
            newest_listed_checkpoint(names[..1].iter().copied()),
            Some(LastCheckpoint {
                version: 5,
                parts: None
            })
        );
        assert_eq!(newest_listed_checkpoint(names[4..].iter().copied()), None);
    }

    #[test]
    fn test_checkpoint_file_names() {
        let single = LastCheckpoint {
            version: 10,
            parts: None,
        };
        assert_eq!(
            checkpoint_files("t/_delta_log/", &single),
            vec!["t/_delta_log/00000000000000000010.checkpoint.parquet"]
        );
        let multi = LastCheckpoint {
            version: 10,
            parts: Some(2),
        };
        assert_eq!(
            checkpoint_files("t/_delta_log/", &multi),
            vec![
                "t/_delta_log/00000000000000000010.checkpoint.0000000001.0000000002.parquet",
                "t/_delta_log/00000000000000000010.checkpoint.0000000002.0000000002.parquet",
            ]
        );
    }
}
