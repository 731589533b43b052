//! Permission-list normalization.
//!
//! Upstream data stored permission lists in several shapes: a proper
//! array of codes, a comma-separated string, or a JSON-encoded string.
//! Normalization happens exactly once, here at the adapter edge; the
//! resolver and services only ever see a typed set.

use std::collections::BTreeSet;

use serde_json::Value;

/// Normalize a stored permission-list value into a set of codes.
///
/// Accepted shapes:
/// - `["a", "b"]` — array of strings (canonical);
/// - `"a,b"` — comma-separated string;
/// - `"[\"a\", \"b\"]"` — JSON array encoded as a string.
///
/// Whitespace around codes is trimmed, empties dropped, duplicates
/// collapsed. Anything unrecognized normalizes to the empty set.
pub fn permission_set(value: &Value) -> BTreeSet<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') {
                match serde_json::from_str::<Value>(trimmed) {
                    Ok(parsed @ Value::Array(_)) => permission_set(&parsed),
                    _ => BTreeSet::new(),
                }
            } else {
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            }
        }
        _ => BTreeSet::new(),
    }
}

/// Serialize a permission set back to the canonical array shape.
pub fn permission_array(codes: &BTreeSet<String>) -> Value {
    Value::Array(codes.iter().cloned().map(Value::String).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_of_strings() {
        let set = permission_set(&json!(["final_approval", "document_review"]));
        assert_eq!(set.len(), 2);
        assert!(set.contains("final_approval"));
        assert!(set.contains("document_review"));
    }

    #[test]
    fn comma_separated_string() {
        let set = permission_set(&json!("final_approval, document_review"));
        assert_eq!(set.len(), 2);
        assert!(set.contains("document_review"));
    }

    #[test]
    fn json_encoded_string() {
        let set = permission_set(&json!("[\"final_approval\",\"manage_users\"]"));
        assert_eq!(set.len(), 2);
        assert!(set.contains("manage_users"));
    }

    #[test]
    fn duplicates_collapse() {
        let set = permission_set(&json!(["a", "a", "b"]));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn empties_and_garbage_drop_out() {
        assert!(permission_set(&json!("")).is_empty());
        assert!(permission_set(&json!(",,")).is_empty());
        assert!(permission_set(&json!(42)).is_empty());
        assert!(permission_set(&json!(null)).is_empty());
        assert!(permission_set(&json!("[not json")).is_empty());
    }

    #[test]
    fn roundtrip_through_array_shape() {
        let set = permission_set(&json!("b, a"));
        let arr = permission_array(&set);
        assert_eq!(arr, json!(["a", "b"]));
    }
}
