//! Recovery for truncated JSON arrays returned by the inference backend.
//!
//! Responses are cut mid-token often enough that a strict parse alone would
//! throw away whole sub-batches. Each pass below repairs one truncation shape
//! and re-parses; records already complete in the prefix survive.

use serde_json::Value;
use tracing::debug;

use super::ExtractError;
use crate::model::PoliceOccurrence;

/// Parse a JSON array of occurrence records, repairing common truncations.
///
/// Passes, in order: strict parse; close an unterminated string and the
/// trailing object/array brackets; drop the trailing partial object and close
/// the array. Whatever parses first wins. Objects missing required fields are
/// dropped individually rather than failing the batch.
pub fn parse_occurrences(raw: &str) -> Result<Vec<PoliceOccurrence>, ExtractError> {
    let trimmed = raw.trim();

    if let Some(records) = try_parse(trimmed) {
        return Ok(records);
    }

    debug!("strict parse failed, attempting bracket repair");
    if let Some(records) = try_parse(&close_brackets(trimmed)) {
        return Ok(records);
    }

    debug!("bracket repair failed, truncating at last complete object");
    if let Some(repaired) = truncate_at_last_object(trimmed) {
        if let Some(records) = try_parse(&repaired) {
            return Ok(records);
        }
    }

    Err(ExtractError::MalformedResponse)
}

fn try_parse(text: &str) -> Option<Vec<PoliceOccurrence>> {
    let values: Vec<Value> = serde_json::from_str(text).ok()?;
    Some(
        values
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
    )
}

/// Close an unterminated string (odd count of unescaped quotes), then any
/// unterminated trailing object, then the array itself.
fn close_brackets(text: &str) -> String {
    let mut repaired = text.to_string();

    let mut quotes = 0usize;
    let mut prev_backslash = false;
    for c in text.chars() {
        if c == '"' && !prev_backslash {
            quotes += 1;
        }
        prev_backslash = c == '\\' && !prev_backslash;
    }
    if quotes % 2 == 1 {
        repaired.push('"');
    }

    if !repaired.ends_with(']') {
        if !repaired.ends_with('}') {
            repaired.push('}');
        }
        repaired.push(']');
    }
    repaired
}

/// Cut everything after the last '}' and close the array, discarding the
/// trailing partial object entirely.
fn truncate_at_last_object(text: &str) -> Option<String> {
    let pos = text.rfind('}')?;
    let mut repaired = text[..=pos].to_string();
    repaired.push(']');
    Some(repaired)
}
