//! Best-effort recovery of truncated JSON responses.

use serde_json::Value;

/// Tries to salvage a response that was cut off mid-structure by keeping
/// the longest prefix of complete word objects.
///
/// Looks for the last `},{` boundary between two array elements, keeps
/// everything through that `}`, and closes the words array and the outer
/// object. Returns `None` when no boundary exists or the shortened text
/// still fails to parse. Lossy: words after the salvage point are gone,
/// so callers should treat the result as partial.
pub fn repair_truncated_json(text: &str) -> Option<Value> {
    let boundary = text.rfind("},{")?;
    let mut repaired = text[..=boundary].to_string();
    repaired.push_str("]}");
    serde_json::from_str(&repaired).ok()
}
