/// Field coercion for records coming back from the record store
///
/// The backend stores multi-value attributes as comma-joined strings and is
/// loose about numeric types (numbers may arrive as JSON strings), so every
/// read goes through these helpers.
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::Record;
use crate::error::{AppError, AppResult};

pub const ID_FIELD: &str = "Id";
const LIST_DELIMITER: char = ',';

/// Joins ids or labels for a multi-value text field
pub fn join_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Splits a multi-value text field, dropping blank entries
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(LIST_DELIMITER)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn str_field(record: &Record, name: &str) -> Option<String> {
    record.get(name).and_then(scalar_to_string)
}

/// Reads a multi-value field stored either as a joined string or an array
pub fn list_field(record: &Record, name: &str) -> Vec<String> {
    match record.get(name) {
        Some(Value::String(s)) => split_list(s),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(other) => scalar_to_string(other).map(|s| split_list(&s)).unwrap_or_default(),
        None => Vec::new(),
    }
}

pub fn int_field(record: &Record, name: &str) -> Option<i64> {
    match record.get(name)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

pub fn float_field(record: &Record, name: &str) -> Option<f64> {
    match record.get(name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn timestamp_field(record: &Record, name: &str) -> Option<DateTime<Utc>> {
    let raw = str_field(record, name)?;
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The record's backend id as a decimal string
pub fn record_id(record: &Record) -> AppResult<String> {
    int_field(record, ID_FIELD)
        .map(|id| id.to_string())
        .ok_or_else(|| AppError::Remote("Record is missing its Id".to_string()))
}

/// Parses a string id into the backend's integer id
///
/// A non-numeric id cannot name a remote record, so it is reported as
/// not found rather than invalid.
pub fn parse_record_id(id: &str, entity: &str) -> AppResult<i64> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| AppError::NotFound(format!("{} not found", entity)))
}

pub fn required_str(record: &Record, name: &str) -> AppResult<String> {
    str_field(record, name)
        .ok_or_else(|| AppError::Remote(format!("Record is missing field {}", name)))
}
