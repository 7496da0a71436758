//! Process-wide file-handle registries keyed on absolute path, so two
//! collectors scraping the same stat file or writing the same log share
//! one handle instead of racing independent opens (§4.6, §9). Mirrors the
//! teacher crate's `NamespaceCache` idiom in `engine/namespace_cache.rs`:
//! a `Lazy<Mutex<HashMap<..>>>` promoted to a process-wide singleton
//! rather than threaded through every call site.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::error::OrchestratorError;

static WRITERS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<File>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Opens `path` in append mode, creating parent directories as needed, and
/// caches the handle keyed on the canonicalized-by-construction path so
/// repeat calls return the same shared handle.
pub fn writer_for(path: &Path) -> Result<Arc<Mutex<File>>, OrchestratorError> {
    let mut registry = WRITERS.lock().unwrap();
    if let Some(handle) = registry.get(path) {
        return Ok(handle.clone());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            OrchestratorError::internal(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path).map_err(|e| {
        OrchestratorError::internal(format!("failed to open log file {}: {e}", path.display()))
    })?;
    let handle = Arc::new(Mutex::new(file));
    registry.insert(path.to_path_buf(), handle.clone());
    Ok(handle)
}
