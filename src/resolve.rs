//! Core resolution pipeline: merge all layers and validate the result.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no I/O, making the full
//! pipeline testable with synthetic inputs. Steps:
//!
//! 1. Start from the programmatic defaults
//! 2. Parse and deep-merge source files (later overrides earlier)
//! 3. Overlay environment variables (always win over files)
//! 4. Check required keys

use std::path::PathBuf;

use confique::Config;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{info, warn};

use crate::env::{self, EnvOptions};
use crate::error::StrataError;
use crate::flatten::flatten;
use crate::merge::deep_merge;
use crate::path::{get_path_mut, set_path};
use crate::validate;

/// All pre-loaded data needed to build a tree. No I/O happens here.
pub struct ResolveInput {
    /// Defaults registered on the builder, already nested.
    pub defaults: Mapping,
    /// File contents in precedence order: first = lowest priority, last = highest.
    pub files: Vec<(PathBuf, String)>,
    /// Raw environment variable pairs.
    pub env_vars: Vec<(String, String)>,
    /// How variables map to keys. `None` means env disabled.
    pub env: Option<EnvOptions>,
    /// Keys that must be non-empty in the final tree.
    pub required: Vec<String>,
}

/// A fully merged and validated tree, with a record of where keys came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub tree: Mapping,
    /// Distinct top-level keys contributed by files, in first-seen order.
    pub file_keys: Vec<String>,
    /// Dotted paths set from environment variables.
    pub env_keys: Vec<String>,
}

/// Resolve a tree from pre-loaded inputs.
///
/// Malformed sources are skipped with a warning. The only error is a missing
/// required key.
pub fn resolve(input: ResolveInput) -> Result<Resolved, StrataError> {
    let mut merged = input.defaults;
    let mut file_keys: Vec<String> = Vec::new();

    for (path, content) in &input.files {
        let Some(layer) = parse_source(path, content) else {
            continue;
        };
        for key in layer.keys() {
            let name = key_name(key);
            if !file_keys.contains(&name) {
                file_keys.push(name);
            }
        }
        merged = deep_merge(merged, layer);
    }

    info!(count = file_keys.len(), "settings loaded from YAML files");
    for key in &file_keys {
        info!(%key, "  - from file");
    }

    let env_keys = match &input.env {
        Some(options) => env::apply_env(&mut merged, input.env_vars, options),
        None => Vec::new(),
    };

    validate::validate_required(&merged, &input.required)?;

    Ok(Resolved {
        tree: merged,
        file_keys,
        env_keys,
    })
}

/// Parse one source. An empty document contributes an empty layer; anything
/// other than a top-level mapping is rejected.
fn parse_source(path: &std::path::Path, content: &str) -> Option<Mapping> {
    match serde_yaml::from_str::<Value>(content) {
        Ok(Value::Mapping(map)) => Some(map),
        Ok(Value::Null) => Some(Mapping::new()),
        Ok(other) => {
            warn!(
                path = %path.display(),
                kind = kind_name(&other),
                "configuration file is not a mapping, skipping"
            );
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "error loading configuration file, skipping");
            None
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

/// Render a mapping key for logs and listings. Non-string keys use their YAML form.
pub(crate) fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{other:?}")),
    }
}

/// Deserialize a tree into a confique config, letting confique fill defaults
/// and check required fields.
///
/// The tree itself keeps environment values as strings. For extraction only,
/// each path in `env_keys` whose string reads as a YAML number or bool is
/// retyped, so `VAR_PORT=443` can fill a `u16` field. A value that still does
/// not fit is reported under its dotted path.
pub fn extract<C: Config, S: AsRef<str>>(tree: &Mapping, env_keys: &[S]) -> Result<C, StrataError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let mut typed = tree.clone();
    for key in env_keys {
        retype_scalar(&mut typed, key.as_ref());
    }

    let layer: C::Layer = match serde_yaml::from_value(Value::Mapping(typed.clone())) {
        Ok(layer) => layer,
        Err(e) => {
            return Err(StrataError::InvalidValue {
                key: failing_key::<C>(&typed).unwrap_or_else(|| "<tree>".into()),
                reason: e.to_string(),
            });
        }
    };

    C::builder()
        .preloaded(layer)
        .load()
        .map_err(StrataError::from)
}

fn retype_scalar(tree: &mut Mapping, dotted_key: &str) {
    let Some(slot) = get_path_mut(tree, dotted_key) else {
        return;
    };
    let Value::String(raw) = slot else {
        return;
    };
    if let Ok(parsed @ (Value::Number(_) | Value::Bool(_))) = serde_yaml::from_str::<Value>(raw) {
        *slot = parsed;
    }
}

/// Find the first leaf that cannot be deserialized on its own.
fn failing_key<C: Config>(tree: &Mapping) -> Option<String>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    flatten(tree).into_iter().find_map(|(key, value)| {
        let mut single = Mapping::new();
        set_path(&mut single, &key.split('.').collect::<Vec<_>>(), value.clone());
        serde_yaml::from_value::<C::Layer>(Value::Mapping(single))
            .is_err()
            .then_some(key)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::TestConfig;
    use crate::path::get_path;
    use crate::types::KeyCase;

    fn env_options() -> Option<EnvOptions> {
        Some(EnvOptions {
            prefix: "PREFIX".into(),
            separator: "_".into(),
            case: KeyCase::Lower,
        })
    }

    fn empty_input() -> ResolveInput {
        ResolveInput {
            defaults: Mapping::new(),
            files: vec![],
            env_vars: vec![],
            env: None,
            required: vec![],
        }
    }

    fn file(name: &str, content: &str) -> (PathBuf, String) {
        (name.into(), content.into())
    }

    #[test]
    fn no_sources_is_empty_tree() {
        let resolved = resolve(empty_input()).unwrap();
        assert!(resolved.tree.is_empty());
        assert!(resolved.file_keys.is_empty());
    }

    #[test]
    fn later_file_overrides_earlier() {
        let input = ResolveInput {
            files: vec![file("first.yaml", "port: 1000\n"), file("second.yaml", "port: 2000\n")],
            ..empty_input()
        };
        let resolved = resolve(input).unwrap();
        assert_eq!(resolved.tree["port"].as_u64(), Some(2000));
    }

    #[test]
    fn base_and_production_with_env_host() {
        let input = ResolveInput {
            files: vec![
                file("base.yaml", "port: 80\nhost: a\n"),
                file("prod.yaml", "port: 443\n"),
            ],
            env_vars: vec![("PREFIX_HOST".into(), "b.example.com".into())],
            env: env_options(),
            required: vec!["port".into(), "host".into()],
            ..empty_input()
        };
        let resolved = resolve(input).unwrap();
        let expected: Mapping = serde_yaml::from_str("port: 443\nhost: b.example.com\n").unwrap();
        assert_eq!(resolved.tree, expected);
        assert_eq!(resolved.env_keys, vec!["host".to_string()]);
    }

    #[test]
    fn env_beats_every_file_regardless_of_order() {
        let input = ResolveInput {
            files: vec![file("a.yaml", "port: 1\n"), file("b.yaml", "port: 2\n")],
            env_vars: vec![("PREFIX_PORT".into(), "3".into())],
            env: env_options(),
            ..empty_input()
        };
        let resolved = resolve(input).unwrap();
        assert_eq!(resolved.tree["port"], Value::String("3".into()));
    }

    #[test]
    fn env_ignored_when_disabled() {
        let input = ResolveInput {
            files: vec![file("a.yaml", "port: 1\n")],
            env_vars: vec![("PREFIX_PORT".into(), "3".into())],
            env: None,
            ..empty_input()
        };
        let resolved = resolve(input).unwrap();
        assert_eq!(resolved.tree["port"].as_u64(), Some(1));
        assert!(resolved.env_keys.is_empty());
    }

    #[test]
    fn malformed_file_is_skipped() {
        let input = ResolveInput {
            files: vec![
                file("base.yaml", "port: 80\n"),
                file("broken.yaml", "port: [unclosed\n"),
                file("local.yaml", "host: a\n"),
            ],
            ..empty_input()
        };
        let resolved = resolve(input).unwrap();
        assert_eq!(resolved.tree["port"].as_u64(), Some(80));
        assert_eq!(resolved.tree["host"].as_str(), Some("a"));
    }

    #[test]
    fn non_mapping_file_is_skipped() {
        let input = ResolveInput {
            files: vec![file("list.yaml", "- a\n- b\n"), file("scalar.yaml", "42\n")],
            ..empty_input()
        };
        let resolved = resolve(input).unwrap();
        assert!(resolved.tree.is_empty());
    }

    #[test]
    fn empty_file_contributes_nothing() {
        let input = ResolveInput {
            files: vec![file("base.yaml", "port: 80\n"), file("empty.yaml", "")],
            ..empty_input()
        };
        let resolved = resolve(input).unwrap();
        assert_eq!(resolved.tree["port"].as_u64(), Some(80));
    }

    #[test]
    fn file_keys_are_distinct_top_level_names() {
        let input = ResolveInput {
            files: vec![
                file("a.yaml", "port: 1\ndatabase:\n  url: x\n"),
                file("b.yaml", "port: 2\nhost: h\n"),
            ],
            ..empty_input()
        };
        let resolved = resolve(input).unwrap();
        assert_eq!(resolved.file_keys, vec!["port", "database", "host"]);
    }

    #[test]
    fn nested_file_merge() {
        let input = ResolveInput {
            files: vec![
                file("base.yaml", "database:\n  url: pg://base\n  pool_size: 5\n"),
                file("local.yaml", "database:\n  pool_size: 50\n"),
            ],
            ..empty_input()
        };
        let resolved = resolve(input).unwrap();
        assert_eq!(
            get_path(&resolved.tree, "database.url").unwrap().as_str(),
            Some("pg://base")
        );
        assert_eq!(
            get_path(&resolved.tree, "database.pool_size").unwrap().as_u64(),
            Some(50)
        );
    }

    #[test]
    fn defaults_lose_to_files_and_env() {
        let defaults: Mapping = serde_yaml::from_str("port: 8080\nhost: localhost\ndebug: false\n").unwrap();
        let input = ResolveInput {
            defaults,
            files: vec![file("base.yaml", "port: 3000\n")],
            env_vars: vec![("PREFIX_HOST".into(), "0.0.0.0".into())],
            env: env_options(),
            ..empty_input()
        };
        let resolved = resolve(input).unwrap();
        assert_eq!(resolved.tree["port"].as_u64(), Some(3000));
        assert_eq!(resolved.tree["host"].as_str(), Some("0.0.0.0"));
        assert_eq!(resolved.tree["debug"].as_bool(), Some(false));
    }

    #[test]
    fn missing_required_key_is_fatal() {
        let input = ResolveInput {
            files: vec![file("base.yaml", "port: 80\n")],
            required: vec!["port".into(), "host".into()],
            ..empty_input()
        };
        let err = resolve(input).unwrap_err();
        assert!(matches!(err, StrataError::MissingRequired { ref key } if key == "host"));
    }

    #[test]
    fn env_can_satisfy_required_key() {
        let input = ResolveInput {
            files: vec![file("base.yaml", "port: 80\n")],
            env_vars: vec![("PREFIX_HOST".into(), "h".into())],
            env: env_options(),
            required: vec!["port".into(), "host".into()],
            ..empty_input()
        };
        assert!(resolve(input).is_ok());
    }

    #[test]
    fn empty_env_value_does_not_satisfy_required_key() {
        let input = ResolveInput {
            files: vec![file("base.yaml", "port: 80\nhost: a\n")],
            env_vars: vec![("PREFIX_HOST".into(), "".into())],
            env: env_options(),
            required: vec!["host".into()],
            ..empty_input()
        };
        assert!(matches!(
            resolve(input),
            Err(StrataError::MissingRequired { .. })
        ));
    }

    #[test]
    fn key_name_renders_non_string_keys() {
        assert_eq!(key_name(&Value::String("port".into())), "port");
        assert_eq!(key_name(&Value::from(8)), "8");
    }

    #[test]
    fn extract_fills_defaults() {
        let tree: Mapping = serde_yaml::from_str("port: 3000\n").unwrap();
        let config: TestConfig = extract::<_, &str>(&tree, &[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.database.pool_size, 5);
        assert_eq!(config.database.url, None);
    }

    #[test]
    fn extract_reads_nested_sections() {
        let tree: Mapping =
            serde_yaml::from_str("database:\n  url: pg://db\n  pool_size: 20\n").unwrap();
        let config: TestConfig = extract::<_, &str>(&tree, &[]).unwrap();
        assert_eq!(config.database.url.as_deref(), Some("pg://db"));
        assert_eq!(config.database.pool_size, 20);
    }

    #[test]
    fn extract_rejects_wrong_type() {
        let tree: Mapping = serde_yaml::from_str("port: not-a-number\n").unwrap();
        let result: Result<TestConfig, _> = extract::<_, &str>(&tree, &[]);
        match result {
            Err(StrataError::InvalidValue { key, .. }) => assert_eq!(key, "port"),
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn extract_names_nested_failing_key() {
        let tree: Mapping =
            serde_yaml::from_str("host: h\ndatabase:\n  url: pg://\n  pool_size: lots\n").unwrap();
        let result: Result<TestConfig, _> = extract::<_, &str>(&tree, &[]);
        match result {
            Err(StrataError::InvalidValue { key, .. }) => assert_eq!(key, "database.pool_size"),
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn extract_retypes_env_strings() {
        let input = ResolveInput {
            files: vec![file("base.yaml", "port: 80\ndebug: false\n")],
            env_vars: vec![
                ("PREFIX_PORT".into(), "443".into()),
                ("PREFIX_DEBUG".into(), "true".into()),
            ],
            env: env_options(),
            ..empty_input()
        };
        let resolved = resolve(input).unwrap();

        let config: TestConfig = extract(&resolved.tree, &resolved.env_keys).unwrap();
        assert_eq!(config.port, 443);
        assert!(config.debug);
        assert_eq!(resolved.tree["port"], Value::String("443".into()));
    }

    #[test]
    fn extract_reports_env_value_that_does_not_fit() {
        let input = ResolveInput {
            files: vec![file("base.yaml", "port: 80\n")],
            env_vars: vec![("PREFIX_PORT".into(), "eighty".into())],
            env: env_options(),
            ..empty_input()
        };
        let resolved = resolve(input).unwrap();
        let result: Result<TestConfig, _> = extract(&resolved.tree, &resolved.env_keys);
        match result {
            Err(StrataError::InvalidValue { key, .. }) => assert_eq!(key, "port"),
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn extract_leaves_file_strings_alone() {
        let tree: Mapping = serde_yaml::from_str("port: '443'\n").unwrap();
        let result: Result<TestConfig, _> = extract::<_, &str>(&tree, &[]);
        assert!(matches!(result, Err(StrataError::InvalidValue { .. })));
    }

    #[test]
    fn extract_keeps_non_scalar_env_text_as_string() {
        let tree: Mapping = serde_yaml::from_str("host: 'a: b'\n").unwrap();
        let config: TestConfig = extract(&tree, &["host"]).unwrap();
        assert_eq!(config.host, "a: b");
    }
}
