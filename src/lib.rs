//! Layered YAML settings with environment overrides and a process-wide store.
//!
//! Strata merges an ordered list of YAML files, overlays environment
//! variables, checks that required keys are present, and hands you a store
//! you can query by dotted path.
//!
//! ```ignore
//! let settings = strata::Settings::builder()
//!     .sources(["configuration/base.yaml", "configuration/production.yaml"])
//!     .env_prefix("MYAPP")
//!     .load()?;
//!
//! let port = settings.get_or("port", 8080);
//! let url = settings.get("database.url");
//! ```
//!
//! # Layer precedence
//!
//! ```text
//! Builder defaults      .default_value("port", 8080)
//!        ↑ overridden by
//! Source files          in list order, later files win
//!        ↑ overridden by
//! Environment vars      VAR_PORT, VAR_DATABASE_URL
//! ```
//!
//! Every layer is **sparse**: a file only needs the keys it changes. Two
//! mappings at the same key merge recursively; anything else (scalar,
//! sequence, or a mapping meeting a non-mapping) is replaced wholesale by the
//! later layer.
//!
//! # Sources
//!
//! [`sources()`](SettingsBuilder::sources) takes paths in **priority-ascending**
//! order. Without it, the conventional base / local / production trio under
//! `configuration/` is used (see [`types`]).
//!
//! A source that is missing, unreadable, malformed, or not a mapping at the
//! top level is skipped with a warning. Loading never fails because of a
//! file; with no usable files at all the tree is simply empty.
//!
//! # Environment variables
//!
//! With the default prefix `VAR` and separator `_`:
//!
//! | Env var | Key |
//! |---------|-----|
//! | `VAR_HOST` | `host` |
//! | `VAR_DATABASE_URL` | `database.url` |
//!
//! Segments are lower-cased unless [`KeyCase::Preserve`] is chosen. Because
//! `_` is the separator, a key containing an underscore cannot be addressed
//! with the default separator; pick `__` with
//! [`env_separator()`](SettingsBuilder::env_separator) if you need that.
//!
//! Values are **always strings**. `VAR_PORT=443` overrides `port: 80` with the
//! string `"443"`, not the number. Use [`Settings::get_as`] or a type that
//! accepts strings when reading such keys.
//!
//! Intermediate levels are created as needed, and a scalar standing where a
//! mapping is required is replaced: `VAR_DATABASE_URL` turns `database: sqlite`
//! into `database: {url: ...}`. The environment always wins.
//!
//! Disable the overlay with [`.no_env()`](SettingsBuilder::no_env).
//!
//! # Required keys
//!
//! After the overlay, every required key (default: `port` and `host`) must
//! hold a non-empty value. Null, `""`, `[]`, and `{}` count as missing. A
//! missing key is the one fatal condition: construction or reload returns
//! [`StrataError::MissingRequired`] naming it.
//!
//! # Reloading
//!
//! [`Settings::reload`] rebuilds from the current source list and
//! [`Settings::reload_from`] from a new one. The environment is re-read and
//! re-applied every time. The rebuilt tree replaces the old one atomically
//! and only after validation passes; a failed reload leaves the previous tree
//! in place and flips [`Settings::status`] to [`Status::Failed`].
//!
//! # Process-wide access
//!
//! The [`global`] module keeps a single lazily built [`Settings`] for the
//! whole process. Repeated calls return the same instance without reading
//! files again; only an explicit reload rebuilds it.
//!
//! # Logging
//!
//! Strata logs through [`tracing`](https://docs.rs/tracing): the top-level
//! keys loaded from files and the paths set from the environment at `info`,
//! skipped files at `warn`. Values are never logged. Install whichever
//! subscriber your application uses.
//!
//! # Typed access
//!
//! [`Settings::extract`] deserializes the merged tree into a
//! [confique](https://docs.rs/confique) struct, filling
//! `#[config(default)]` values for anything the tree does not set.
//! Environment values that read as numbers or booleans are converted for the
//! struct, so `VAR_PORT=443` fills a `u16` field; a field that still does not
//! fit is reported by its dotted path.
//! [`generate_template`] renders a commented YAML starter file from the same
//! struct.

pub mod error;
pub mod global;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod env;
mod file;
mod flatten;
pub(crate) mod merge;
mod ops;
mod path;
mod resolve;
mod store;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::SettingsBuilder;
#[cfg(feature = "clap")]
pub use cli::{ConfigArgs, ConfigSubcommand};
pub use error::StrataError;
pub use ops::{ConfigResult, generate_template};
pub use serde_yaml::{Mapping, Value};
pub use store::{Settings, Snapshot};
pub use types::{ConfigAction, KeyCase, Status};

/// The merged settings tree: a YAML mapping of mappings, sequences, and scalars.
pub type ConfigTree = Mapping;
