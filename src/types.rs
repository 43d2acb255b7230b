//! Shared vocabulary types and the conventional defaults.
//!
//! # Default layout
//!
//! With no explicit source list, settings are read from three conventional
//! files under `configuration/` in the working directory, lowest priority
//! first:
//!
//! ```text
//! configuration/base.yaml         shared defaults
//! configuration/local.yaml        developer overrides
//! configuration/production.yaml   deployment overrides
//! ```
//!
//! Any of them may be absent. Environment variables named `VAR_<KEY>` then
//! override whatever the files produced.

use std::path::PathBuf;

/// Environment variable prefix used unless the builder sets another.
pub const DEFAULT_ENV_PREFIX: &str = "VAR";

/// Separator between the prefix and each path segment in a variable name.
pub const DEFAULT_ENV_SEPARATOR: &str = "_";

/// Keys that must be present and non-empty after every build.
pub const DEFAULT_REQUIRED: &[&str] = &["port", "host"];

/// The base / local / production source list, in precedence order.
pub fn default_sources() -> Vec<PathBuf> {
    ["base.yaml", "local.yaml", "production.yaml"]
        .iter()
        .map(|name| PathBuf::from("configuration").join(name))
        .collect()
}

/// How environment variable segments are turned into tree keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyCase {
    /// `VAR_DATABASE_URL` addresses `database.url`.
    #[default]
    Lower,
    /// Segments are used exactly as written in the variable name.
    Preserve,
}

impl KeyCase {
    pub(crate) fn apply(self, segment: &str) -> String {
        match self {
            KeyCase::Lower => segment.to_lowercase(),
            KeyCase::Preserve => segment.to_string(),
        }
    }
}

/// Outcome of the most recent build of a settings store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The current snapshot came from the most recent build.
    Ready,
    /// The most recent reload failed. Reads still see the last good snapshot.
    Failed { reason: String },
}

/// A settings operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    List,
    Get { key: String },
    Dump,
}
