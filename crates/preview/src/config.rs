//! Preview budgets.

/// Maximum rows rendered in a tabular preview
pub const DEFAULT_ROW_CAP: usize = 1000;

/// Maximum bytes rendered in a raw text/binary preview
pub const DEFAULT_BYTE_CAP: usize = 50_000;

/// Objects above this size are refused before they are decoded (256 MiB)
pub const DEFAULT_MAX_OBJECT_BYTES: usize = 256 * 1024 * 1024;

/// Budgets applied to every preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewConfig {
    pub row_cap: usize,
    pub byte_cap: usize,
    /// Hard ceiling on fetched object size; everything is buffered in memory
    pub max_object_bytes: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            row_cap: DEFAULT_ROW_CAP,
            byte_cap: DEFAULT_BYTE_CAP,
            max_object_bytes: DEFAULT_MAX_OBJECT_BYTES,
        }
    }
}

impl PreviewConfig {
    pub fn with_row_cap(mut self, row_cap: usize) -> Self {
        self.row_cap = row_cap;
        self
    }

    pub fn with_byte_cap(mut self, byte_cap: usize) -> Self {
        self.byte_cap = byte_cap;
        self
    }

    pub fn with_max_object_bytes(mut self, max_object_bytes: usize) -> Self {
        self.max_object_bytes = max_object_bytes;
        self
    }
}
