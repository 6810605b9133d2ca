//! Filename-based format detection.

use std::fmt;

/// Content kind chosen from a filename extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectedFormat {
    Csv,
    Parquet,
    Avro,
    Json,
    Xml,
    /// Anything else; routed to the raw text/binary decoder
    Unknown,
}

impl DetectedFormat {
    /// Classify by the lowercase extension of the last path segment.
    ///
    /// No content sniffing happens here; unmapped names yield `Unknown`.
    pub fn classify(filename: &str) -> Self {
        let name = filename.rsplit('/').next().unwrap_or(filename);
        let Some((_, ext)) = name.rsplit_once('.') else {
            return DetectedFormat::Unknown;
        };
        match ext.to_ascii_lowercase().as_str() {
            "csv" => DetectedFormat::Csv,
            "parquet" => DetectedFormat::Parquet,
            "avro" => DetectedFormat::Avro,
            "json" => DetectedFormat::Json,
            "xml" => DetectedFormat::Xml,
            _ => DetectedFormat::Unknown,
        }
    }

    /// Formats that always decode to rows and columns
    pub fn is_tabular(self) -> bool {
        matches!(
            self,
            DetectedFormat::Csv | DetectedFormat::Parquet | DetectedFormat::Avro
        )
    }
}

impl fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectedFormat::Csv => "csv",
            DetectedFormat::Parquet => "parquet",
            DetectedFormat::Avro => "avro",
            DetectedFormat::Json => "json",
            DetectedFormat::Xml => "xml",
            DetectedFormat::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(DetectedFormat::classify("a.csv"), DetectedFormat::Csv);
        assert_eq!(
            DetectedFormat::classify("data/part-0.parquet"),
            DetectedFormat::Parquet
        );
        assert_eq!(DetectedFormat::classify("x/y/z.avro"), DetectedFormat::Avro);
        assert_eq!(DetectedFormat::classify("cfg.json"), DetectedFormat::Json);
        assert_eq!(DetectedFormat::classify("feed.xml"), DetectedFormat::Xml);
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert_eq!(DetectedFormat::classify("REPORT.CSV"), DetectedFormat::Csv);
        assert_eq!(DetectedFormat::classify("a.Json"), DetectedFormat::Json);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(DetectedFormat::classify("README"), DetectedFormat::Unknown);
        assert_eq!(DetectedFormat::classify("notes.txt"), DetectedFormat::Unknown);
        assert_eq!(DetectedFormat::classify("a.csv.gz"), DetectedFormat::Unknown);
        assert_eq!(DetectedFormat::classify("dir.csv/file"), DetectedFormat::Unknown);
        assert_eq!(DetectedFormat::classify(""), DetectedFormat::Unknown);
    }

    #[test]
    fn test_is_tabular() {
        assert!(DetectedFormat::Parquet.is_tabular());
        assert!(!DetectedFormat::Json.is_tabular());
        assert!(!DetectedFormat::Unknown.is_tabular());
    }
}
