use std::path::PathBuf;

use serde_yaml::Value;

use crate::env::EnvOptions;
use crate::error::StrataError;
use crate::path;
use crate::store::{LoadOptions, Settings};
use crate::types::{self, DEFAULT_ENV_PREFIX, DEFAULT_ENV_SEPARATOR, DEFAULT_REQUIRED, KeyCase};

/// Builder for configuring and loading layered settings.
///
/// Every knob has a conventional default, so `Settings::builder().load()`
/// reads the base / local / production files under `configuration/`, overlays
/// `VAR_*` variables, and requires `port` and `host`.
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    sources: Option<Vec<PathBuf>>,
    env_prefix: Option<String>,
    env_separator: Option<String>,
    env_case: KeyCase,
    env_enabled: bool,
    required: Option<Vec<String>>,
    defaults: Vec<(String, Value)>,
    env_vars: Option<Vec<(String, String)>>,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBuilder {
    pub(crate) fn new() -> Self {
        Self {
            sources: None,
            env_prefix: None,
            env_separator: None,
            env_case: KeyCase::default(),
            env_enabled: true,
            required: None,
            defaults: Vec::new(),
            env_vars: None,
        }
    }

    /// Replace the default source list entirely.
    ///
    /// Sources are listed in **priority-ascending** order: the last entry has
    /// the highest priority.
    pub fn sources<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.sources = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Append a source without replacing the defaults.
    /// If no sources have been set yet, starts from the base / local / production list.
    pub fn add_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources
            .get_or_insert_with(types::default_sources)
            .push(path.into());
        self
    }

    /// Override the environment variable prefix (default: `VAR`).
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Override the separator between prefix and segments (default: `_`).
    pub fn env_separator(mut self, separator: &str) -> Self {
        self.env_separator = Some(separator.to_string());
        self
    }

    /// Choose how variable segments become keys (default: lower-cased).
    pub fn env_case(mut self, case: KeyCase) -> Self {
        self.env_case = case;
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Replace the required keys (default: `port`, `host`). Dotted paths are accepted.
    pub fn required<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Register a default value by dotted key. Defaults sit below every file
    /// and every environment variable.
    pub fn default_value<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.defaults.push((key.to_string(), value.into()));
        self
    }

    /// Use a fixed set of variables instead of the process environment.
    #[cfg(test)]
    pub(crate) fn env_vars(mut self, vars: Vec<(String, String)>) -> Self {
        self.env_vars = Some(vars);
        self
    }

    fn effective_sources(&self) -> Vec<PathBuf> {
        self.sources.clone().unwrap_or_else(types::default_sources)
    }

    fn effective_env(&self) -> Option<EnvOptions> {
        if !self.env_enabled {
            return None;
        }
        Some(EnvOptions {
            prefix: self
                .env_prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_ENV_PREFIX.to_string()),
            separator: self
                .env_separator
                .clone()
                .unwrap_or_else(|| DEFAULT_ENV_SEPARATOR.to_string()),
            case: self.env_case,
        })
    }

    fn effective_required(&self) -> Vec<String> {
        match &self.required {
            Some(keys) => keys.clone(),
            None => DEFAULT_REQUIRED.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Load sources, overlay the environment, and validate required keys.
    pub fn load(self) -> Result<Settings, StrataError> {
        let sources = self.effective_sources();
        let options = LoadOptions {
            defaults: path::entries_to_mapping(&self.defaults),
            env: self.effective_env(),
            required: self.effective_required(),
            env_vars: self.env_vars,
        };
        Settings::load(options, sources)
    }
}
