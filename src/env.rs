use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::path::set_path;
use crate::types::KeyCase;

/// How environment variable names map onto tree paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOptions {
    pub prefix: String,
    pub separator: String,
    pub case: KeyCase,
}

/// Decompose a variable name into tree path segments.
///
/// `VAR_DATABASE_URL` with prefix `VAR` and separator `_` becomes
/// `["database", "url"]`. Returns `None` if the name does not carry the prefix,
/// has nothing after it, or contains an empty segment.
pub fn parse_env_key(name: &str, options: &EnvOptions) -> Option<Vec<String>> {
    if options.separator.is_empty() {
        return None;
    }
    let rest = name
        .strip_prefix(options.prefix.as_str())?
        .strip_prefix(options.separator.as_str())?;
    if rest.is_empty() {
        return None;
    }

    let segments: Vec<String> = rest
        .split(options.separator.as_str())
        .map(|s| options.case.apply(s))
        .collect();
    if segments.iter().any(String::is_empty) {
        return None;
    }
    Some(segments)
}

/// Overlay matching environment variables onto `tree`.
///
/// Values are written as raw strings, whatever the type of the value they
/// replace. Variables are applied in iteration order, so a later variable
/// addressing the same path wins. Returns the dotted paths that were set.
///
/// Takes an iterator so tests can pass synthetic data instead of the process
/// environment.
pub fn apply_env(
    tree: &mut Mapping,
    vars: impl IntoIterator<Item = (String, String)>,
    options: &EnvOptions,
) -> Vec<String> {
    let needle = format!("{}{}", options.prefix, options.separator);
    let mut applied = Vec::new();

    for (name, value) in vars {
        if !name.starts_with(&needle) {
            continue;
        }
        let Some(segments) = parse_env_key(&name, options) else {
            debug!(variable = %name, "ignoring environment variable with no usable key");
            continue;
        };
        set_path(tree, &segments, Value::String(value));
        applied.push(segments.join("."));
    }

    if !applied.is_empty() {
        info!(count = applied.len(), "settings loaded from environment variables");
        for key in &applied {
            info!(%key, "  - from environment");
        }
    }

    applied
}

/// Snapshot the process environment, skipping entries that are not valid UTF-8.
pub fn process_vars() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}
