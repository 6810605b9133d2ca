//! Row and byte budgets.

/// Counts records offered against a row cap
///
/// Decoders call [`RowBudget::admit`] once per source record (including the
/// ones past the cap) so that `truncated` reflects the full record count.
#[derive(Debug, Clone, Copy)]
pub struct RowBudget {
    cap: usize,
    seen: usize,
}

impl RowBudget {
    pub fn new(cap: usize) -> Self {
        Self { cap, seen: 0 }
    }

    /// Record one more source row; true if it fits in the budget
    pub fn admit(&mut self) -> bool {
        self.seen += 1;
        self.seen <= self.cap
    }

    /// Record `rows` source rows that will not be materialized
    pub fn observe(&mut self, rows: usize) {
        self.seen += rows;
    }

    /// Rows still allowed before the cap is reached
    pub fn remaining(&self) -> usize {
        self.cap.saturating_sub(self.seen)
    }

    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn truncated(&self) -> bool {
        self.seen > self.cap
    }
}

/// First `cap` bytes of `bytes`, and whether anything was cut
pub fn cap_bytes(bytes: &[u8], cap: usize) -> (&[u8], bool) {
    if bytes.len() > cap {
        (&bytes[..cap], true)
    } else {
        (bytes, false)
    }
}
