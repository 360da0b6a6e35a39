use serde::{Deserialize, Serialize};

/// Quality counters accumulated while reading a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Well-formed data lines, including reference-only calls.
    pub total_records: usize,
    /// Records dropped because the call was homozygous reference.
    pub reference_only: usize,
    /// Data lines skipped as parse anomalies.
    pub malformed_lines: usize,
    /// Non-fatal header problems.
    pub warnings: Vec<String>,
    /// Set when reading stopped early on an I/O failure.
    pub read_error: Option<String>,
}

impl ParseStats {
    /// Records that were handed to the caller.
    pub fn emitted(&self) -> usize {
        self.total_records - self.reference_only
    }

    /// False when the stream was cut short.
    pub fn parsing_success(&self) -> bool {
        self.read_error.is_none()
    }
}
