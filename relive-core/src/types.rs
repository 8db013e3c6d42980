//! Domain types for the reload pipeline.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Everything here serializes via serde so reload events can be consumed
//! programmatically as well as logged.

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed identity for a loaded module, as assigned by the host
/// loader (typically the resolved specifier).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub String);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ModuleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Watch bookkeeping
// ---------------------------------------------------------------------------

/// Per-path watch bookkeeping. Created on first observation (initial scan or
/// load hook), updated on each confirmed change, and kept for the life of the
/// process; the watch set only grows.
#[derive(Debug, Clone)]
pub struct WatchedFile {
    pub path: PathBuf,
    pub module: ModuleId,
    /// Last observed modification time; `None` until the first probe lands.
    pub mtime: Option<SystemTime>,
    /// Last observed content digest (hex SHA-256), when the digest freshness
    /// strategy is active.
    pub digest: Option<String>,
}

impl WatchedFile {
    pub fn new(path: PathBuf, module: ModuleId) -> Self {
        Self {
            path,
            module,
            mtime: None,
            digest: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine diff entries
// ---------------------------------------------------------------------------

/// One unit of the engine primitive's change log.
///
/// The primitive's result is loosely structured; fields it did not set are
/// defaulted and anything it set that we do not know about lands in `extra`
/// so the classifier can surface it verbatim instead of dropping it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Name of the function the entry is about, when it is about one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_patched: Option<String>,
    /// Set when the engine could not relink the named function.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub function_info_not_found: bool,
    /// Pure position remap; the code itself is unchanged.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub position_patched: bool,
    /// The entry links a live object to its pre-patch script version.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub linked_to_old_script: bool,
    /// Everything else the primitive reported.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DiffEntry {
    /// Entry for a successfully relinked function.
    pub fn patched(name: impl Into<String>) -> Self {
        Self {
            function_patched: Some(name.into()),
            ..Self::default()
        }
    }

    /// Entry for a function the engine could not relink.
    pub fn blocked(name: impl Into<String>) -> Self {
        Self {
            function_patched: Some(name.into()),
            function_info_not_found: true,
            ..Self::default()
        }
    }

    /// Position-only remap entry.
    pub fn position_only() -> Self {
        Self {
            position_patched: true,
            ..Self::default()
        }
    }

    /// Prior-version linkage entry.
    pub fn linked_to_prior() -> Self {
        Self {
            linked_to_old_script: true,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Classified outcome for one diff entry. Exhaustive: every entry shape maps
/// to exactly one variant, with [`PatchOutcome::Unrecognized`] as the
/// catch-all for shapes the classifier does not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatchOutcome {
    /// The function's body was replaced in place.
    FunctionPatched { name: String },
    /// The function could not be replaced; its old code stays live.
    FunctionBlocked { name: String, reason: String },
    /// Source positions were remapped; informational, not displayed.
    PositionOnly,
    /// A live object was linked to the pre-patch script; informational.
    LinkedToPrior,
    /// Entry shape the classifier does not recognize, surfaced verbatim.
    Unrecognized { raw: serde_json::Value },
}

impl PatchOutcome {
    /// Whether the reporter should show this outcome to the user.
    pub fn is_displayed(&self) -> bool {
        !matches!(self, PatchOutcome::PositionOnly | PatchOutcome::LinkedToPrior)
    }
}

/// One completed reload of one file: the ordered per-function outcomes the
/// engine reported, stamped with when the patch was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReloadEvent {
    pub path: PathBuf,
    pub outcomes: Vec<PatchOutcome>,
    pub at: DateTime<Utc>,
}

impl ReloadEvent {
    pub fn new(path: PathBuf, outcomes: Vec<PatchOutcome>) -> Self {
        Self {
            path,
            outcomes,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn diff_entry_roundtrips_known_fields() {
        let entry = DiffEntry::blocked("handler");
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(
            json,
            json!({"function_patched": "handler", "function_info_not_found": true})
        );
        let back: DiffEntry = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, entry);
    }

    #[test]
    fn diff_entry_keeps_unknown_fields_in_extra() {
        let raw = json!({"script_relinked": true, "dropped_from_stack": 2});
        let entry: DiffEntry = serde_json::from_value(raw.clone()).expect("deserialize");
        assert!(entry.function_patched.is_none());
        assert_eq!(entry.extra.len(), 2);
        assert_eq!(serde_json::to_value(&entry).expect("serialize"), raw);
    }

    #[test]
    fn informational_outcomes_are_not_displayed() {
        assert!(!PatchOutcome::PositionOnly.is_displayed());
        assert!(!PatchOutcome::LinkedToPrior.is_displayed());
        assert!(PatchOutcome::FunctionPatched {
            name: "f".into()
        }
        .is_displayed());
        assert!(PatchOutcome::Unrecognized { raw: json!({}) }.is_displayed());
    }

    #[test]
    fn module_id_display_matches_inner() {
        assert_eq!(ModuleId::from("lib/app.js").to_string(), "lib/app.js");
    }
}
