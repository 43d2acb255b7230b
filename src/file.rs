//! Reading configuration sources from disk.
//!
//! Sources are read in list order and returned in the same order, so the
//! resolve pipeline can fold them lowest-priority first. A source that cannot
//! be read contributes nothing: a missing file is expected (the default list
//! names three optional layers), and any other I/O failure is reported but
//! never aborts the load.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Read every source that exists, in order. Missing and unreadable files are
/// skipped with a warning.
pub fn read_sources(paths: &[PathBuf]) -> Vec<(PathBuf, String)> {
    paths
        .iter()
        .filter_map(|path| read_source(path).map(|content| (path.clone(), content)))
        .collect()
}

fn read_source(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "configuration file not found");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read configuration file");
            None
        }
    }
}
