//! Dotted-path addressing into a [`ConfigTree`](crate::ConfigTree).
//!
//! Lookups never fail: a missing segment or a non-mapping intermediate simply
//! yields `None`. Writes create intermediate mapping levels on demand and
//! replace any non-mapping value standing in the way, so the written path
//! always exists afterwards.
//!
//! Segments always address string keys. A mapping key written as a YAML
//! number or bool (`ports: {8080: a}`) is not reachable as `ports.8080`, and
//! writing that path adds a separate string key beside the numeric one.

use serde_yaml::{Mapping, Value};

/// Navigate a mapping by dotted key path (e.g. `"database.url"`).
///
/// The final segment may resolve to any value, including nested mappings and
/// sequences.
pub fn get_path<'a>(tree: &'a Mapping, dotted_key: &str) -> Option<&'a Value> {
    let (path, leaf) = match dotted_key.rsplit_once('.') {
        Some((p, l)) => (Some(p), l),
        None => (None, dotted_key),
    };

    let map = match path {
        Some(path) => {
            let mut current = tree;
            for segment in path.split('.') {
                current = current.get(segment)?.as_mapping()?;
            }
            current
        }
        None => tree,
    };

    map.get(leaf)
}

/// Mutable counterpart of [`get_path`].
pub fn get_path_mut<'a>(tree: &'a mut Mapping, dotted_key: &str) -> Option<&'a mut Value> {
    let mut segments = dotted_key.split('.');
    let leaf = segments.next_back()?;

    let mut current = tree;
    for segment in segments {
        current = current.get_mut(segment)?.as_mapping_mut()?;
    }
    current.get_mut(leaf)
}

/// Write `value` at the path named by `segments`.
///
/// Every segment but the last is a mapping level, created if absent. A scalar
/// or sequence occupying an intermediate slot is overwritten with a fresh
/// mapping. The leaf is replaced unconditionally.
pub fn set_path<S: AsRef<str>>(tree: &mut Mapping, segments: &[S], value: Value) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };

    let mut current = tree;
    for segment in parents {
        let key = Value::String(segment.as_ref().to_string());
        let slot = current
            .entry(key)
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !slot.is_mapping() {
            *slot = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(next) = slot else {
            unreachable!("slot was just made a mapping");
        };
        current = next;
    }

    current.insert(Value::String(leaf.as_ref().to_string()), value);
}

/// Convert dotted-key entries into a nested mapping.
///
/// `("database.url", "pg://")` becomes `{database: {url: "pg://"}}`.
/// If multiple entries target the same key, the last one wins.
pub fn entries_to_mapping(entries: &[(String, Value)]) -> Mapping {
    let mut tree = Mapping::new();
    for (dotted_key, value) in entries {
        let segments: Vec<&str> = dotted_key.split('.').collect();
        set_path(&mut tree, &segments, value.clone());
    }
    tree
}
