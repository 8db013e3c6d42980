//! Live patch driver.
//!
//! ## `apply`: per-reload protocol
//!
//! 1. Look up the engine-tracked script for the path; absent → no-op
//!    (the file is watched but was never loaded).
//! 2. Compare the freshly wrapped text with the engine's recorded source by
//!    value; equal → no-op (idempotence).
//! 3. Invoke the primitive and classify its change log.
//!
//! Primitive errors propagate to the caller, which logs them and keeps the
//! watch alive; a rejected patch leaves the previously loaded code live.

use std::path::Path;

use similar::TextDiff;

use relive_core::types::ReloadEvent;

use crate::capability::LivePatch;
use crate::classify::classify;
use crate::error::PatchError;

/// Attempt to live-patch the tracked script for `path` with `wrapped` source.
///
/// Returns `Ok(None)` when there was nothing to do, `Ok(Some(event))` with the
/// classified per-function outcomes when a patch was attempted.
pub fn apply(
    engine: &mut dyn LivePatch,
    path: &Path,
    wrapped: &str,
) -> Result<Option<ReloadEvent>, PatchError> {
    let Some(handle) = engine.find_script(path) else {
        tracing::debug!("no tracked script for {}", path.display());
        return Ok(None);
    };
    let Some(recorded) = engine.script_source(handle) else {
        return Ok(None);
    };

    if recorded == wrapped {
        tracing::debug!("source unchanged: {}", path.display());
        return Ok(None);
    }

    match engine.set_script_source(handle, wrapped) {
        Ok(entries) => Ok(Some(ReloadEvent::new(
            path.to_path_buf(),
            classify(&entries),
        ))),
        Err(err) => {
            if tracing::log_enabled!(tracing::Level::Debug) {
                let unified = TextDiff::from_lines(recorded.as_str(), wrapped)
                    .unified_diff()
                    .header("recorded", "proposed")
                    .context_radius(3)
                    .to_string();
                tracing::debug!("rejected patch for {}:\n{unified}", path.display());
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use relive_core::types::{DiffEntry, PatchOutcome};

    use super::*;
    use crate::capability::ScriptHandle;

    /// Engine double that records every primitive invocation.
    struct CountingEngine {
        path: PathBuf,
        source: String,
        patches: usize,
    }

    impl CountingEngine {
        fn tracking(path: &str, source: &str) -> Self {
            Self {
                path: PathBuf::from(path),
                source: source.to_owned(),
                patches: 0,
            }
        }
    }

    impl LivePatch for CountingEngine {
        fn find_script(&self, path: &Path) -> Option<ScriptHandle> {
            (path == self.path).then_some(ScriptHandle(1))
        }

        fn script_source(&self, handle: ScriptHandle) -> Option<String> {
            (handle == ScriptHandle(1)).then(|| self.source.clone())
        }

        fn set_script_source(
            &mut self,
            _handle: ScriptHandle,
            new_source: &str,
        ) -> Result<Vec<DiffEntry>, PatchError> {
            self.patches += 1;
            self.source = new_source.to_owned();
            Ok(vec![DiffEntry::patched("main")])
        }
    }

    #[test]
    fn untracked_path_is_a_noop() {
        let mut engine = CountingEngine::tracking("/srv/app.js", "old");
        let event = apply(&mut engine, Path::new("/srv/other.js"), "new").expect("apply");
        assert!(event.is_none());
        assert_eq!(engine.patches, 0);
    }

    #[test]
    fn identical_source_triggers_zero_patch_attempts() {
        let mut engine = CountingEngine::tracking("/srv/app.js", "same");
        let event = apply(&mut engine, Path::new("/srv/app.js"), "same").expect("apply");
        assert!(event.is_none());
        assert_eq!(engine.patches, 0);
    }

    #[test]
    fn changed_source_patches_once_then_idempotent() {
        let mut engine = CountingEngine::tracking("/srv/app.js", "v1");

        let first = apply(&mut engine, Path::new("/srv/app.js"), "v2")
            .expect("apply")
            .expect("event");
        assert_eq!(engine.patches, 1);
        assert_eq!(first.outcomes.len(), 1);
        assert!(matches!(
            first.outcomes[0],
            PatchOutcome::FunctionPatched { ref name } if name == "main"
        ));

        // Applying the identical wrapped text again must not reach the engine.
        let second = apply(&mut engine, Path::new("/srv/app.js"), "v2").expect("apply");
        assert!(second.is_none());
        assert_eq!(engine.patches, 1);
    }

    #[test]
    fn primitive_error_propagates_and_source_stays() {
        struct RejectingEngine(CountingEngine);
        impl LivePatch for RejectingEngine {
            fn find_script(&self, path: &Path) -> Option<ScriptHandle> {
                self.0.find_script(path)
            }
            fn script_source(&self, handle: ScriptHandle) -> Option<String> {
                self.0.script_source(handle)
            }
            fn set_script_source(
                &mut self,
                _handle: ScriptHandle,
                _new_source: &str,
            ) -> Result<Vec<DiffEntry>, PatchError> {
                Err(PatchError::Rejected {
                    message: "frame restart unsupported".to_owned(),
                })
            }
        }

        let mut engine = RejectingEngine(CountingEngine::tracking("/srv/app.js", "v1"));
        let err = apply(&mut engine, Path::new("/srv/app.js"), "v2").expect_err("rejected");
        assert!(matches!(err, PatchError::Rejected { .. }));
        assert_eq!(
            engine.0.source, "v1",
            "recorded source must survive a rejected patch"
        );
    }
}
