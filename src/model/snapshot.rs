//! One parsed variable assignment from a log.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::Fields;

/// Key used when a scalar assignment is wrapped into a mapping.
pub const SCALAR_KEY: &str = "Value";

/// A single occurrence of a variable assignment, with its reconstructed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    /// 1-based, in file order.
    pub version: usize,
    /// Verbatim from the log line.
    pub timestamp: String,
    /// Verbatim from the log line; not necessarily numeric.
    pub line_number: String,
    /// The captured source line, for diagnostics.
    pub raw_line: String,
    pub data: Fields,
}

impl VersionSnapshot {
    /// Empty data, or a single scalar whose text is literally `null`.
    pub fn is_null_equivalent(&self) -> bool {
        if self.data.is_empty() {
            return true;
        }
        self.data.len() == 1
            && matches!(self.data.get(SCALAR_KEY), Some(Value::String(s)) if s == "null")
    }
}
