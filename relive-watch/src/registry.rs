//! Watch registry: one OS-level subscription per unique loaded file.
//!
//! Subscriptions are held for the process lifetime; the watch set only grows.
//! Acceptable for a dev tool; the set is bounded by the host's loaded-module
//! cache.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use notify::{recommended_watcher, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use relive_core::config::ReloadConfig;
use relive_core::loader::{LoadedModule, Loader};
use relive_core::types::WatchedFile;

use crate::error::{io_err, WatchError};

/// Tracks every watched file and owns the notify watcher feeding the runtime.
pub struct WatchRegistry {
    watcher: RecommendedWatcher,
    watched: HashMap<PathBuf, WatchedFile>,
    config: ReloadConfig,
}

impl WatchRegistry {
    /// Create a registry whose filesystem events land on `event_tx`.
    pub fn new(
        config: ReloadConfig,
        event_tx: mpsc::UnboundedSender<notify::Result<Event>>,
    ) -> Result<Self, WatchError> {
        let watcher = recommended_watcher(move |event| {
            let _ = event_tx.send(event);
        })?;
        Ok(Self {
            watcher,
            watched: HashMap::new(),
            config,
        })
    }

    /// Register `module`'s file for change notification. Idempotent: returns
    /// `false` when the path is already watched (or filtered out), `true`
    /// when a new subscription was armed.
    pub fn watch(&mut self, module: &LoadedModule) -> Result<bool, WatchError> {
        if !self.config.watches_path(&module.path) {
            tracing::debug!(path = %module.path.display(), "extension not watched");
            return Ok(false);
        }

        // Canonicalize so event paths (which arrive as real paths, e.g.
        // /private/var/... on macOS) match the map keys.
        let canonical = match std::fs::canonicalize(&module.path) {
            Ok(path) => path,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %module.path.display(), "module file gone; not watching");
                return Ok(false);
            }
            Err(err) => return Err(io_err(&module.path, err)),
        };

        if self.watched.contains_key(&canonical) {
            return Ok(false);
        }

        self.watcher.watch(&canonical, RecursiveMode::NonRecursive)?;

        let mut file = WatchedFile::new(canonical.clone(), module.id.clone());
        // Record the load-time mtime so the first notification compares
        // against something real.
        file.mtime = std::fs::metadata(&canonical)
            .and_then(|meta| meta.modified())
            .ok();

        tracing::debug!(path = %canonical.display(), module = %module.id, "watching");
        self.watched.insert(canonical, file);
        Ok(true)
    }

    /// Bulk-register the startup load set. A registration failure for one
    /// module is logged and never affects the others.
    pub fn watch_all(&mut self, loader: &dyn Loader) {
        for module in loader.loaded_modules() {
            if let Err(err) = self.watch(&module) {
                tracing::warn!(module = %module.id, error = %err, "failed to watch module");
            }
        }
    }

    /// The bookkeeping entry for a (canonical) event path.
    pub fn entry_mut(&mut self, path: &Path) -> Option<&mut WatchedFile> {
        self.watched.get_mut(path)
    }

    pub fn is_watched(&self, path: &Path) -> bool {
        self.watched.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }
}
