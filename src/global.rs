//! The process-wide settings handle.
//!
//! At most one [`Settings`] exists per process through this module. The first
//! successful [`init`] or [`load`] builds it; every later call returns that
//! same instance without reading any file again. Rebuilding happens only on
//! an explicit reload, which swaps the tree inside the existing instance, so
//! every holder of the `&'static Settings` observes the new data.
//!
//! ```ignore
//! let settings = strata::global::load(None, false)?;
//! let port = settings.get_or("port", 8080);
//! ```
//!
//! Code that prefers passing the store around explicitly can skip this module
//! and keep the result of [`Settings::builder()`] instead.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};

use serde_yaml::Value;

use crate::builder::SettingsBuilder;
use crate::error::StrataError;
use crate::store::Settings;

static GLOBAL: OnceLock<Settings> = OnceLock::new();
static INIT: Mutex<()> = Mutex::new(());

/// Build the process-wide settings from `builder`, unless they already exist.
///
/// Racing first callers are serialized, so exactly one build runs. If that
/// build fails the handle stays uninitialized and the error goes to the
/// caller; a later call starts a fresh build.
pub fn init(builder: SettingsBuilder) -> Result<&'static Settings, StrataError> {
    init_inner(builder).map(|(settings, _)| settings)
}

/// Like [`init`], also reporting whether this call performed the build.
fn init_inner(builder: SettingsBuilder) -> Result<(&'static Settings, bool), StrataError> {
    if let Some(settings) = GLOBAL.get() {
        return Ok((settings, false));
    }

    let _guard = INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(settings) = GLOBAL.get() {
        return Ok((settings, false));
    }

    let settings = builder.load()?;
    Ok((GLOBAL.get_or_init(|| settings), true))
}

/// Get the process-wide settings, building them with the conventional
/// defaults on first use.
///
/// `sources` replaces the default base / local / production list. When the
/// settings already exist, `sources` is ignored unless `reload` is set, in
/// which case the existing instance is rebuilt from `sources` (or from its
/// current list if `None`). This holds even when another thread finished the
/// first build while this call was waiting for it.
pub fn load(sources: Option<Vec<PathBuf>>, reload: bool) -> Result<&'static Settings, StrataError> {
    if let Some(settings) = GLOBAL.get() {
        if reload {
            rebuild(settings, sources)?;
        }
        return Ok(settings);
    }

    let builder = match &sources {
        Some(sources) => Settings::builder().sources(sources.clone()),
        None => Settings::builder(),
    };
    let (settings, built) = init_inner(builder)?;
    if reload && !built {
        rebuild(settings, sources)?;
    }
    Ok(settings)
}

fn rebuild(settings: &Settings, sources: Option<Vec<PathBuf>>) -> Result<(), StrataError> {
    match sources {
        Some(sources) => settings.reload_from(sources),
        None => settings.reload(),
    }
}

/// The process-wide settings, if they have been built.
pub fn instance() -> Option<&'static Settings> {
    GLOBAL.get()
}

/// Look up a dotted path in the process-wide settings.
/// Returns `None` if the path does not resolve or nothing has been built yet.
pub fn get(dotted_key: &str) -> Option<Value> {
    GLOBAL.get()?.get(dotted_key)
}

/// Rebuild the process-wide settings from their current sources, building
/// them with the defaults if they do not exist yet.
pub fn reload() -> Result<(), StrataError> {
    load(None, true).map(|_| ())
}
