//! Log history: every assignment of one variable, as an ordered series.
//!
//! Debug logs record assignments as pipe-delimited lines:
//!
//! ```text
//! 12:00:01.0 (1234)|VARIABLE_ASSIGNMENT|[42]|acc|{"Name":"Acme"}|0x3b1c
//! ^timestamp                            ^line ^var ^value          ^address
//! ```
//!
//! Parsing is pure and best effort: lines that mention the variable without
//! being an assignment are skipped, and values that look structured but fail
//! to parse degrade to a raw/warning mapping instead of failing the scan.

use regex::Regex;
use serde_json::{Map, Value};

use crate::model::{Fields, SCALAR_KEY, VersionSnapshot};

/// Event token marking an assignment entry.
pub const ASSIGNMENT_MARKER: &str = "VARIABLE_ASSIGNMENT";

/// Key holding unparseable structured text.
pub const RAW_VALUE_KEY: &str = "Raw Value";

/// Key flagging a parse failure next to [`RAW_VALUE_KEY`].
pub const WARNING_KEY: &str = "_warning";

/// Key used when an assigned collection is empty.
pub const INFO_KEY: &str = "info";

const TRUNCATED_WARNING: &str = "Could not parse JSON (likely truncated in log)";
const EMPTY_LIST_INFO: &str = "Empty List";

/// Parse every assignment of `variable` in `log` into versioned snapshots.
///
/// Versions are numbered from 1 in file order; no sorting or deduplication
/// is performed. An empty result means the variable was never assigned.
pub fn parse_log(log: &str, variable: &str) -> Vec<VersionSnapshot> {
    let pattern = match assignment_pattern(variable) {
        Ok(pattern) => pattern,
        Err(e) => {
            tracing::warn!(variable, error = %e, "cannot build assignment pattern");
            return Vec::new();
        }
    };
    let mut versions = Vec::new();

    for line in log.lines() {
        // Cheap rejection before running the pattern.
        if !line.contains(variable) || !line.contains(ASSIGNMENT_MARKER) {
            continue;
        }

        let Some(caps) = pattern.captures(line) else {
            continue;
        };

        let value = strip_trailing_metadata(&caps[3]);

        versions.push(VersionSnapshot {
            version: versions.len() + 1,
            timestamp: caps[1].to_string(),
            line_number: caps[2].to_string(),
            raw_line: line.to_string(),
            data: interpret_value(value),
        });
    }

    tracing::debug!(variable, count = versions.len(), "parsed log history");
    versions
}

/// Line-anchored pattern for one variable's assignments.
///
/// The variable name is escaped so it always matches literally.
fn assignment_pattern(variable: &str) -> Result<Regex, regex::Error> {
    let pattern = format!(
        r"^([0-9:.]+) .*\|{marker}\|\[([^\]]+)\]\|{var}\|(.*)$",
        marker = ASSIGNMENT_MARKER,
        var = regex::escape(variable),
    );
    // Escaped, so only an oversized name can fail here.
    Regex::new(&pattern)
}

/// Drop a trailing `|annotation` (e.g. an object address) from the value.
fn strip_trailing_metadata(value: &str) -> &str {
    match value.rfind('|') {
        Some(at) => &value[..at],
        None => value,
    }
}

/// Reconstruct the assigned value as a field mapping.
fn interpret_value(value: &str) -> Fields {
    let trimmed = value.trim();

    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return single(SCALAR_KEY, Value::String(trimmed.to_string()));
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => map,
        Ok(Value::Array(items)) => match items.into_iter().next() {
            // Only the first element is kept.
            Some(Value::Object(map)) => map,
            Some(other) => single(SCALAR_KEY, other),
            None => single(INFO_KEY, Value::String(EMPTY_LIST_INFO.to_string())),
        },
        Ok(other) => single(SCALAR_KEY, other),
        Err(e) => {
            tracing::debug!(error = %e, "assigned value is not valid JSON");
            let mut map = Map::new();
            map.insert(RAW_VALUE_KEY.to_string(), Value::String(value.to_string()));
            map.insert(
                WARNING_KEY.to_string(),
                Value::String(TRUNCATED_WARNING.to_string()),
            );
            map
        }
    }
}

fn single(key: &str, value: Value) -> Fields {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    map
}
