//! Structural shape detection for raw documents.

use serde_json::Value;

use crate::config::EngineConfig;
use crate::models::RecordShape;

/// Where the records of a raw document live.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeMatch<'v> {
    /// The document is, or holds, a list of records.
    Array(&'v [Value]),
    /// The document, or a sub-field, maps arbitrary keys to records.
    /// Entries are already in output order.
    Map(Vec<(&'v str, &'v Value)>),
    /// Nothing record-like was found.
    Flat,
}

impl ShapeMatch<'_> {
    pub fn shape(&self) -> RecordShape {
        match self {
            Self::Array(_) => RecordShape::Array,
            Self::Map(_) => RecordShape::Map,
            Self::Flat => RecordShape::Flat,
        }
    }
}

/// Detect the shape of one raw payload. First structural match wins:
/// array (the payload itself, then each configured array field), then
/// map (each configured map field, then the payload itself), then flat.
pub fn detect_shape<'v>(raw: &'v Value, config: &EngineConfig) -> ShapeMatch<'v> {
    if let Value::Array(items) = raw {
        return ShapeMatch::Array(items);
    }

    for field in &config.shapes.array_fields {
        if let Some(Value::Array(items)) = raw.get(field) {
            return ShapeMatch::Array(items);
        }
    }

    let candidates = config
        .shapes
        .map_fields
        .iter()
        .filter_map(|field| raw.get(field))
        .chain(std::iter::once(raw));

    for candidate in candidates {
        let entries = record_entries(candidate, config);
        if !entries.is_empty() {
            return ShapeMatch::Map(entries);
        }
    }

    ShapeMatch::Flat
}

/// Record-like entries of an object, sorted numerically when every key is
/// integer-like, otherwise in enumeration order.
fn record_entries<'v>(value: &'v Value, config: &EngineConfig) -> Vec<(&'v str, &'v Value)> {
    let Some(map) = value.as_object() else {
        return Vec::new();
    };

    let entries: Vec<(&str, &Value)> = map
        .iter()
        .filter(|(_, v)| looks_like_record(v, config))
        .map(|(k, v)| (k.as_str(), v))
        .collect();
    order_by_integer_keys(entries)
}

/// Sort entries numerically by key when every key is integer-like;
/// otherwise leave them in enumeration order.
pub fn order_by_integer_keys<'v>(entries: Vec<(&'v str, &'v Value)>) -> Vec<(&'v str, &'v Value)> {
    let numeric_keys: Option<Vec<i64>> = entries.iter().map(|(k, _)| integer_key(k)).collect();
    match numeric_keys {
        Some(keys) => {
            let mut keyed: Vec<(i64, (&str, &Value))> = keys.into_iter().zip(entries).collect();
            keyed.sort_by_key(|(n, _)| *n);
            keyed.into_iter().map(|(_, entry)| entry).collect()
        }
        None => entries,
    }
}

/// Values of a list, or of an object in key order; anything else is empty.
pub fn list_or_map_values(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            let entries = map.iter().map(|(k, v)| (k.as_str(), v)).collect();
            order_by_integer_keys(entries).into_iter().map(|(_, v)| v).collect()
        }
        _ => Vec::new(),
    }
}

/// An object carrying at least one marker field (text-, date- or metric-like).
pub fn looks_like_record(value: &Value, config: &EngineConfig) -> bool {
    match value.as_object() {
        Some(obj) => config.record_markers().any(|marker| obj.contains_key(marker)),
        None => false,
    }
}

/// Parse keys such as `"0"`, `"17"` or `"-3"`. Anything else is not integer-like.
pub fn integer_key(key: &str) -> Option<i64> {
    let digits = key.strip_prefix('-').unwrap_or(key);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}
