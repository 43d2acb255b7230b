//! Flatten a tree into dotted key-value pairs.

use serde_yaml::{Mapping, Value};

use crate::resolve::key_name;

/// Flatten `tree` into `(dotted_key, leaf)` pairs, depth first, in mapping order.
///
/// Non-empty mappings are recursed into. Everything else is a leaf, including
/// sequences and empty mappings:
/// `{database: {url: "pg://"}, hosts: [a]}` → `[("database.url", "pg://"), ("hosts", [a])]`
pub fn flatten(tree: &Mapping) -> Vec<(String, &Value)> {
    let mut out = Vec::new();
    flatten_into(tree, "", &mut out);
    out
}

fn flatten_into<'a>(map: &'a Mapping, prefix: &str, out: &mut Vec<(String, &'a Value)>) {
    for (key, value) in map {
        let name = key_name(key);
        let dotted = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}.{name}")
        };
        match value {
            Value::Mapping(nested) if !nested.is_empty() => flatten_into(nested, &dotted, out),
            leaf => out.push((dotted, leaf)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn keys(tree: &Mapping) -> Vec<String> {
        flatten(tree).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn flat_keys() {
        let tree = mapping("host: a\nport: 1\n");
        assert_eq!(keys(&tree), vec!["host", "port"]);
    }

    #[test]
    fn nested_keys_are_dotted() {
        let tree = mapping("database:\n  url: pg://\n  pool:\n    size: 5\n");
        assert_eq!(keys(&tree), vec!["database.url", "database.pool.size"]);
    }

    #[test]
    fn sequences_are_leaves() {
        let tree = mapping("hosts: [a, b]\n");
        let flat = flatten(&tree);
        assert_eq!(flat.len(), 1);
        assert!(flat[0].1.is_sequence());
    }

    #[test]
    fn empty_mapping_is_a_leaf() {
        let tree = mapping("database: {}\n");
        let flat = flatten(&tree);
        assert_eq!(flat[0].0, "database");
        assert!(flat[0].1.is_mapping());
    }

    #[test]
    fn null_is_a_leaf() {
        let tree = mapping("url: ~\n");
        let flat = flatten(&tree);
        assert_eq!(flat, vec![("url".to_string(), &Value::Null)]);
    }

    #[test]
    fn empty_tree_flattens_to_nothing() {
        assert!(flatten(&Mapping::new()).is_empty());
    }
}
