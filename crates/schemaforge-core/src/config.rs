//! # Config Shape Helpers
//!
//! Readers for the nested name → definition mappings accepted by
//! `Schema::apply_config`. Every helper reports failures as
//! `SchemaError::InvalidConfigShape` with the dotted path of the value.

use crate::SchemaError;
use serde_json::{Map, Value};

/// A JSON object.
pub type ConfigMap = Map<String, Value>;

/// Require an associative mapping.
///
/// Lists are rejected explicitly: indexed structures are never accepted
/// where a name → definition mapping is required.
pub fn expect_map<'a>(value: &'a Value, path: &str) -> Result<&'a ConfigMap, SchemaError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Array(_) => Err(SchemaError::shape(
            path,
            "expected a name -> definition mapping, found a list",
        )),
        other => Err(SchemaError::shape(
            path,
            format!("expected a mapping, found {}", kind_of(other)),
        )),
    }
}

/// Require a string.
pub fn expect_str<'a>(value: &'a Value, path: &str) -> Result<&'a str, SchemaError> {
    value
        .as_str()
        .ok_or_else(|| SchemaError::shape(path, format!("expected a string, found {}", kind_of(value))))
}

/// Require a boolean.
pub fn expect_bool(value: &Value, path: &str) -> Result<bool, SchemaError> {
    value
        .as_bool()
        .ok_or_else(|| SchemaError::shape(path, format!("expected a boolean, found {}", kind_of(value))))
}

/// Require a list of strings.
pub fn expect_string_list(value: &Value, path: &str) -> Result<Vec<String>, SchemaError> {
    let items = value
        .as_array()
        .ok_or_else(|| SchemaError::shape(path, format!("expected a list, found {}", kind_of(value))))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| expect_str(item, &format!("{}[{}]", path, i)).map(str::to_string))
        .collect()
}

/// Read an optional string entry from a mapping.
pub fn optional_str(map: &ConfigMap, key: &str, path: &str) -> Result<Option<String>, SchemaError> {
    map.get(key)
        .map(|v| expect_str(v, &join(path, key)).map(str::to_string))
        .transpose()
}

/// Reject keys outside the allow-list.
pub fn reject_unknown_keys(map: &ConfigMap, allowed: &[&str], path: &str) -> Result<(), SchemaError> {
    let unknown: Vec<&str> = map
        .keys()
        .map(String::as_str)
        .filter(|k| !allowed.contains(k))
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::shape(
            path,
            format!(
                "unknown keys [{}] (allowed: {})",
                unknown.join(", "),
                allowed.join(", ")
            ),
        ))
    }
}

/// Join a config path with a child key.
#[must_use]
pub fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Render a config value as a schema literal (used for argument defaults).
#[must_use]
pub fn to_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("{:?}", s),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(to_literal).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, to_literal(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
