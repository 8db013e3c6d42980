//! The engine live-patch capability and its startup gates.
//!
//! Both traits here are seams to externally-owned facilities: the host engine
//! implements [`LivePatch`] over its real script-replacement primitive, and
//! runtimes where the primitive ships disabled implement [`NativeToggle`] to
//! switch it on. The capability may be entirely absent at runtime; the watch
//! runtime detects that once at startup and disables the whole subsystem
//! rather than failing per event.

use std::fmt;
use std::path::Path;

use relive_core::types::DiffEntry;

use crate::error::PatchError;

/// Opaque identity of a script the engine is tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptHandle(pub u64);

/// The engine's live-patch primitive.
///
/// Contract (externally owned): `set_script_source` structurally diffs the
/// old and new parsed function trees. Functions whose only change is inside
/// the body, with stable enclosing structure, are relinked in place; functions
/// that were removed or whose enclosing scope changed shape are flagged
/// blocked; top-level restructuring is the most likely to reject outright.
/// Stack frames currently executing a replaced function keep running the old
/// code until they return; no frame invalidation. The call is synchronous
/// and atomic relative to any code running in the process.
pub trait LivePatch {
    /// The tracked script for `path`, if the engine ever loaded one.
    fn find_script(&self, path: &Path) -> Option<ScriptHandle>;

    /// The engine's currently recorded source for a tracked script.
    fn script_source(&self, handle: ScriptHandle) -> Option<String>;

    /// Replace the script's source, returning the per-function change log.
    fn set_script_source(
        &mut self,
        handle: ScriptHandle,
        new_source: &str,
    ) -> Result<Vec<DiffEntry>, PatchError>;
}

/// Optional native facility that widens runtime-version support.
///
/// Queried once at startup when [`RuntimeVersion::needs_native_toggle`] says
/// so. Failure degrades gracefully; the subsystem runs without it.
pub trait NativeToggle {
    /// Attempt to enable the live-patch facility. Returns whether it is now
    /// enabled.
    fn enable(&mut self) -> Result<bool, PatchError>;
}

/// Host runtime version, parsed from a `v8.3.0`-style string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl RuntimeVersion {
    /// Parse `"v8.3.0"` or `"8.3.0"`. Missing components default to zero.
    pub fn parse(version: &str) -> Option<Self> {
        let trimmed = version.strip_prefix('v').unwrap_or(version);
        let mut parts = trimmed.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
        let patch = parts.next().map_or(Some(0), |p| p.parse().ok())?;
        Some(Self {
            major,
            minor,
            patch,
        })
    }

    /// Runtimes in the 8.x line after 8.2 ship the primitive disabled and
    /// need the native toggle to switch it back on.
    pub fn needs_native_toggle(&self) -> bool {
        self.major == 8 && self.minor > 2
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}
