//! Conversions between SQLite TEXT columns and domain types.

use chrono::{DateTime, Utc};
use serde_json::Value as Json;

use crate::error::StoreError;

pub fn datetime_to_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub fn string_to_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::validation(format!("invalid datetime: {s}")))
}

pub fn optional_string_to_datetime(
    s: &Option<String>,
) -> Result<Option<DateTime<Utc>>, StoreError> {
    match s {
        Some(s) => Ok(Some(string_to_datetime(s)?)),
        None => Ok(None),
    }
}

pub fn json_to_string(value: &Json) -> String {
    value.to_string()
}

pub fn string_to_json(s: &str) -> Result<Json, StoreError> {
    if s.trim().is_empty() {
        return Ok(Json::Object(serde_json::Map::new()));
    }
    serde_json::from_str(s).map_err(StoreError::from)
}

/// Shallow-merge `patch` into `base`, overwriting matching top-level keys.
pub fn merge_json(base: &Json, patch: &Json) -> Json {
    let mut merged = base.clone();
    if let (Json::Object(merged_map), Json::Object(patch_map)) = (&mut merged, patch) {
        for (k, v) in patch_map {
            merged_map.insert(k.clone(), v.clone());
        }
    }
    merged
}
