//! Helpers for turning model output into JSON

use serde_json::{Map, Value};
use tracing::error;

/// Remove a surrounding Markdown code fence (```json ... ```), if any.
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json) on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse `response` as a JSON object carrying every key in `expected_keys`.
/// Logs and returns `None` otherwise.
pub fn json_object(response: &str, expected_keys: &[&str]) -> Option<Map<String, Value>> {
    let value: Value = match serde_json::from_str(strip_code_fences(response)) {
        Ok(value) => value,
        Err(e) => {
            error!("Invalid JSON response: {e}");
            return None;
        }
    };
    let Value::Object(object) = value else {
        error!("Expected a JSON object, got: {value}");
        return None;
    };
    let missing: Vec<&str> = expected_keys
        .iter()
        .copied()
        .filter(|key| !object.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        error!("Missing required keys in response: {missing:?}");
        return None;
    }
    Some(object)
}
