//! The settings store: an immutable snapshot behind an atomic pointer.
//!
//! Reads load the current [`Snapshot`] without locking. Builds (the initial
//! one and every reload) run under a mutex that also guards the source list,
//! so two reloads never interleave. A reload publishes its snapshot only
//! after the whole pipeline, validation included, has succeeded; readers see
//! either the old tree or the new one, never a half-built one.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use confique::Config;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use tracing::{debug, error, info};

use crate::builder::SettingsBuilder;
use crate::env::{self, EnvOptions};
use crate::error::StrataError;
use crate::file;
use crate::ops::{self, ConfigResult};
use crate::path::get_path;
use crate::resolve::{self, ResolveInput};
use crate::types::{ConfigAction, Status};

/// One fully built and validated tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    tree: Mapping,
    generation: u64,
    file_keys: Vec<String>,
    env_keys: Vec<String>,
}

impl Snapshot {
    /// The merged tree.
    pub fn tree(&self) -> &Mapping {
        &self.tree
    }

    /// Build counter: 1 for the initial build, incremented by every successful reload.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Top-level keys that came from files.
    pub fn file_keys(&self) -> &[String] {
        &self.file_keys
    }

    /// Dotted paths that were set from environment variables.
    pub fn env_keys(&self) -> &[String] {
        &self.env_keys
    }

    pub fn get(&self, dotted_key: &str) -> Option<&Value> {
        get_path(&self.tree, dotted_key)
    }
}

/// Everything a build needs besides the source list. Fixed for the store's lifetime.
#[derive(Debug, Clone)]
pub(crate) struct LoadOptions {
    pub defaults: Mapping,
    pub env: Option<EnvOptions>,
    pub required: Vec<String>,
    /// Replaces the process environment when set.
    pub env_vars: Option<Vec<(String, String)>>,
}

impl LoadOptions {
    fn build(&self, sources: &[PathBuf], generation: u64) -> Result<Snapshot, StrataError> {
        let files = file::read_sources(sources);
        let env_vars = match (&self.env, &self.env_vars) {
            (None, _) => Vec::new(),
            (Some(_), Some(vars)) => vars.clone(),
            (Some(_), None) => env::process_vars(),
        };

        let resolved = resolve::resolve(ResolveInput {
            defaults: self.defaults.clone(),
            files,
            env_vars,
            env: self.env.clone(),
            required: self.required.clone(),
        })?;

        debug!(generation, "settings built");
        Ok(Snapshot {
            tree: resolved.tree,
            generation,
            file_keys: resolved.file_keys,
            env_keys: resolved.env_keys,
        })
    }
}

struct Lifecycle {
    sources: Vec<PathBuf>,
    status: Status,
}

/// Layered settings: files, then environment, validated, queryable by dotted path.
///
/// Construct through [`Settings::builder()`], or use the process-wide handle
/// in [`global`](crate::global).
pub struct Settings {
    options: LoadOptions,
    lifecycle: Mutex<Lifecycle>,
    current: ArcSwap<Snapshot>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("generation", &self.generation())
            .field("sources", &self.sources())
            .field("status", &self.status())
            .finish()
    }
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Run the initial build. Fails if a required key is missing.
    pub(crate) fn load(options: LoadOptions, sources: Vec<PathBuf>) -> Result<Self, StrataError> {
        let snapshot = options.build(&sources, 1)?;
        Ok(Self {
            options,
            lifecycle: Mutex::new(Lifecycle {
                sources,
                status: Status::Ready,
            }),
            current: ArcSwap::from_pointee(snapshot),
        })
    }

    /// Look up a value by dotted path. Returns `None` as soon as a segment is
    /// missing or an intermediate value is not a mapping.
    pub fn get(&self, dotted_key: &str) -> Option<Value> {
        self.current.load().get(dotted_key).cloned()
    }

    /// Look up a value, falling back to `default` when the path does not resolve.
    pub fn get_or(&self, dotted_key: &str, default: impl Into<Value>) -> Value {
        self.get(dotted_key).unwrap_or_else(|| default.into())
    }

    /// Look up a value and deserialize it.
    ///
    /// Environment overrides are always strings, so a key overridden from the
    /// environment only converts to types that accept a string.
    pub fn get_as<T: DeserializeOwned>(&self, dotted_key: &str) -> Result<Option<T>, StrataError> {
        let Some(value) = self.get(dotted_key) else {
            return Ok(None);
        };
        serde_yaml::from_value(value)
            .map(Some)
            .map_err(|e| StrataError::InvalidValue {
                key: dotted_key.into(),
                reason: e.to_string(),
            })
    }

    pub fn contains(&self, dotted_key: &str) -> bool {
        self.current.load().get(dotted_key).is_some()
    }

    /// The current snapshot. Holding it keeps that tree alive across reloads.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }

    /// The source list the next [`reload`](Self::reload) will read.
    pub fn sources(&self) -> Vec<PathBuf> {
        self.lock().sources.clone()
    }

    pub fn status(&self) -> Status {
        self.lock().status.clone()
    }

    /// Rebuild from the current source list and re-apply the environment.
    ///
    /// On failure the previous snapshot stays in place, [`status`](Self::status)
    /// reports [`Status::Failed`], and the error is returned.
    pub fn reload(&self) -> Result<(), StrataError> {
        let mut lifecycle = self.lock();
        self.rebuild(&mut lifecycle)
    }

    /// Replace the source list, then rebuild. Keys absent from the new sources
    /// do not survive.
    pub fn reload_from<I, P>(&self, sources: I) -> Result<(), StrataError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut lifecycle = self.lock();
        lifecycle.sources = sources.into_iter().map(Into::into).collect();
        self.rebuild(&mut lifecycle)
    }

    fn rebuild(&self, lifecycle: &mut Lifecycle) -> Result<(), StrataError> {
        let generation = self.current.load().generation + 1;
        match self.options.build(&lifecycle.sources, generation) {
            Ok(snapshot) => {
                self.current.store(Arc::new(snapshot));
                lifecycle.status = Status::Ready;
                info!(generation, "settings reloaded");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "settings reload failed");
                lifecycle.status = Status::Failed {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deserialize the current tree into a confique config struct.
    ///
    /// Values missing from the tree fall back to the struct's
    /// `#[config(default)]`; confique reports fields that have neither.
    /// Environment values that read as numbers or booleans are converted for
    /// the struct; the stored tree keeps them as strings.
    pub fn extract<C: Config>(&self) -> Result<C, StrataError>
    where
        C::Layer: for<'de> Deserialize<'de>,
    {
        let snapshot = self.current.load();
        resolve::extract(snapshot.tree(), snapshot.env_keys())
    }

    /// Handle a `ConfigAction` (list / get / dump).
    pub fn handle(&self, action: &ConfigAction) -> Result<ConfigResult, StrataError> {
        let snapshot = self.current.load();
        match action {
            ConfigAction::List => Ok(ops::list_values(snapshot.tree())),
            ConfigAction::Get { key } => ops::get_value(snapshot.tree(), key),
            ConfigAction::Dump => ops::dump(snapshot.tree()),
        }
    }

    /// Handle a `ConfigAction` and print the result to stdout.
    pub fn handle_and_print(&self, action: &ConfigAction) -> Result<(), StrataError> {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }
}
