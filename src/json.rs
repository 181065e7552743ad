use crate::error::{Result, TnsError};
use crate::tree::*;
use serde::Serialize;
use serde_json::Value;

/// Serialize the alias table to compact JSON.
pub fn to_json(entries: &EntryMap) -> Result<String> {
    Ok(serde_json::to_string(entries)?)
}

/// Serialize the alias table to pretty-printed JSON.
pub fn to_json_pretty(entries: &EntryMap) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Serialized form of a parsed table: `[entries, search index, sorted]`.
#[derive(Serialize)]
struct SnapshotRef<'a>(&'a EntryMap, &'a SearchIndex, bool);

/// Encode the full parser state as an opaque snapshot string.
pub fn snapshot(entries: &EntryMap, search: &SearchIndex, sorted: bool) -> Result<String> {
    Ok(serde_json::to_string(&SnapshotRef(entries, search, sorted))?)
}

/// Decode a snapshot produced by [`snapshot`], validating its shape.
pub fn restore(blob: &str) -> Result<(EntryMap, SearchIndex, bool)> {
    let value: Value = serde_json::from_str(blob).map_err(|e| bad_format(e.to_string()))?;
    let Value::Array(parts) = value else {
        return Err(bad_format("expected a three-element array"));
    };
    let [entries, search, sorted]: [Value; 3] = parts
        .try_into()
        .map_err(|parts: Vec<Value>| bad_format(format!("expected 3 fields, found {}", parts.len())))?;

    let (Value::Object(entries), Value::Object(search)) = (entries, search) else {
        return Err(bad_format("entries and search index must be objects"));
    };
    if entries.len() != search.len() {
        return Err(bad_format(format!(
            "entry count {} does not match search index count {}",
            entries.len(),
            search.len()
        )));
    }
    let Value::Bool(sorted) = sorted else {
        return Err(bad_format("sorted flag must be a boolean"));
    };

    let entries: EntryMap = serde_json::from_value(Value::Object(entries))
        .map_err(|e| bad_format(format!("entries: {}", e)))?;
    let search: SearchIndex = serde_json::from_value(Value::Object(search))
        .map_err(|e| bad_format(format!("search index: {}", e)))?;

    Ok((entries, search, sorted))
}

fn bad_format(message: impl Into<String>) -> TnsError {
    TnsError::RestoreFormat(message.into())
}
