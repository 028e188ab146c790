//! JSON encoding shortcuts.

use serde::Serialize;

/// Encodes `value` as compact JSON, or returns an empty string if it cannot
/// be serialized.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
