//! New-module hook.
//!
//! The host's loader calls [`LoadHook::module_loaded`] after each successful
//! resolve so newly loaded modules join the watch set automatically. This is
//! an explicit observer on the loader seam, not a patch of the loader's
//! resolution entry point, and it never returns an error to the caller; a
//! registration problem must not abort the load that triggered it.

use relive_core::loader::LoadedModule;
use tokio::sync::mpsc;

/// Clonable handle for delivering load notifications to the reload runtime.
#[derive(Debug, Clone)]
pub struct LoadHook {
    tx: mpsc::UnboundedSender<LoadedModule>,
}

impl LoadHook {
    pub(crate) fn new(tx: mpsc::UnboundedSender<LoadedModule>) -> Self {
        Self { tx }
    }

    /// Notify the runtime that `module` finished loading. Infallible from the
    /// caller's point of view; delivery problems are logged.
    pub fn module_loaded(&self, module: LoadedModule) {
        if self.tx.send(module).is_err() {
            tracing::debug!("reload runtime stopped; dropping module-loaded notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_modules_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let hook = LoadHook::new(tx);

        hook.module_loaded(LoadedModule::new("a", "/srv/a.js"));
        hook.module_loaded(LoadedModule::new("b", "/srv/b.js"));

        assert_eq!(rx.recv().await.expect("first").id.0, "a");
        assert_eq!(rx.recv().await.expect("second").id.0, "b");
    }

    #[test]
    fn closed_runtime_does_not_panic_the_caller() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let hook = LoadHook::new(tx);
        hook.module_loaded(LoadedModule::new("late", "/srv/late.js"));
    }
}
