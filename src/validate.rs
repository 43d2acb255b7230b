//! Required-key validation.
//!
//! A required key is satisfied only by a non-empty value. Null, the empty
//! string, and empty sequences or mappings all count as missing. Numbers and
//! booleans are always present, including `0` and `false`; a plain truthiness
//! test would treat those two as missing, this check does not.

use serde_yaml::{Mapping, Value};

use crate::error::StrataError;
use crate::path::get_path;

/// Check every key in order and report the first one that is missing.
pub fn validate_required<S: AsRef<str>>(tree: &Mapping, keys: &[S]) -> Result<(), StrataError> {
    for key in keys {
        let key = key.as_ref();
        let present = get_path(tree, key).is_some_and(|v| !is_empty(v));
        if !present {
            return Err(StrataError::MissingRequired { key: key.to_string() });
        }
    }
    Ok(())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        Value::Tagged(tagged) => is_empty(&tagged.value),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
