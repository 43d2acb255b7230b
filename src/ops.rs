//! Settings operations: key lookup, listing, dumping, and result types.
//!
//! Provides the logic behind `config list`, `config get`, and `config dump`,
//! plus the `ConfigResult` enum that callers use to display results. Unlike
//! [`Settings::get`](crate::Settings::get), `get_value` treats an unknown key
//! as an error, since a user asked for it by name.

use std::fmt;

use confique::Config;
use serde_yaml::{Mapping, Value};

use crate::error::StrataError;
use crate::flatten::flatten;
use crate::path::get_path;

/// Result of a settings operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// A key's resolved value.
    KeyValue { key: String, value: String },
    /// All resolved key-value pairs, flattened to dotted keys.
    Listing { entries: Vec<(String, String)> },
    /// The whole merged tree as pretty-printed JSON.
    Dump(String),
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::KeyValue { key, value } => write!(f, "{key} = {value}"),
            ConfigResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
            ConfigResult::Dump(json) => write!(f, "{json}"),
        }
    }
}

/// Get a value by dotted key, formatted for display.
pub fn get_value(tree: &Mapping, key: &str) -> Result<ConfigResult, StrataError> {
    let value = get_path(tree, key).ok_or_else(|| StrataError::KeyNotFound(key.into()))?;
    Ok(ConfigResult::KeyValue {
        key: key.into(),
        value: format_value(value),
    })
}

/// List all resolved values as flattened dotted key-value pairs.
pub fn list_values(tree: &Mapping) -> ConfigResult {
    let entries = flatten(tree)
        .into_iter()
        .map(|(key, value)| (key, format_value(value)))
        .collect();
    ConfigResult::Listing { entries }
}

/// Render the whole tree as JSON.
pub fn dump(tree: &Mapping) -> Result<ConfigResult, StrataError> {
    serde_json::to_string_pretty(tree)
        .map(ConfigResult::Dump)
        .map_err(|e| StrataError::InvalidValue {
            key: "<dump>".into(),
            reason: e.to_string(),
        })
}

/// Generate a commented YAML template from a confique struct's doc comments
/// and defaults. Useful as a starting point for `base.yaml`.
pub fn generate_template<C: Config>() -> String {
    confique::yaml::template::<C>(confique::yaml::FormatOptions::default())
}

/// Format a value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "<not set>".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Sequence(_) | Value::Mapping(_) => {
            serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"))
        }
        Value::Tagged(_) => serde_yaml::to_string(value)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{value:?}")),
    }
}
