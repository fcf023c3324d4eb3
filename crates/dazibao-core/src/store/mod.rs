//! The single exclusion boundary around the configuration tree.
//!
//! Every read for rendering and every per-tick write from every scheduler
//! goes through one [`ConfigStore`]. A mutation and its persistence happen in
//! one critical section, so a snapshot shows each block either entirely
//! before or entirely after a tick.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error};

use crate::blocks::DashboardConfig;
use crate::config::loading::save_config_file;

/// Cloneable handle to the shared tree.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    inner: Arc<Mutex<DashboardConfig>>,
    /// Where the tree is persisted after every mutation. `None` keeps it in memory.
    path: Option<Arc<PathBuf>>,
}

impl ConfigStore {
    /// Store that rewrites `path` after every mutation.
    pub fn with_persistence(config: DashboardConfig, path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(config)),
            path: Some(Arc::new(path.into())),
        }
    }

    /// Store that never touches the filesystem.
    pub fn in_memory(config: DashboardConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(config)),
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().map(PathBuf::as_path)
    }

    fn lock(&self) -> MutexGuard<'_, DashboardConfig> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // Mutation closures never run command execution, so the tree
                // is whole even if a closure panicked after writing.
                error!(
                    event = "core.store.lock_poisoned",
                    "Config store mutex poisoned, continuing with inner value"
                );
                poisoned.into_inner()
            }
        }
    }

    /// Independent copy of the whole tree at one instant.
    pub fn snapshot(&self) -> DashboardConfig {
        self.lock().clone()
    }

    /// Apply `f` to the tree and persist the result, in one critical section.
    ///
    /// A persistence failure is logged and otherwise ignored: the in-memory
    /// change stays committed and is served to renderers.
    pub fn mutate<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut DashboardConfig) -> R,
    {
        let mut guard = self.lock();
        let result = f(&mut guard);
        self.persist(&guard);
        result
    }

    /// Like [`mutate`](Self::mutate), but `f` reports whether it changed
    /// anything. `None` means the tree is untouched and the file is not
    /// rewritten.
    pub fn try_mutate<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut DashboardConfig) -> Option<R>,
    {
        let mut guard = self.lock();
        let result = f(&mut guard)?;
        self.persist(&guard);
        Some(result)
    }

    fn persist(&self, tree: &DashboardConfig) {
        let Some(path) = &self.path else {
            return;
        };
        match save_config_file(tree, path) {
            Ok(()) => debug!(event = "core.store.persist_completed", path = %path.display()),
            Err(e) => error!(
                event = "core.store.persist_failed",
                path = %path.display(),
                error = %e,
                "Failed to persist config; in-memory state is still served"
            ),
        }
    }
}
