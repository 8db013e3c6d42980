//! Per-function outcome classification.
//!
//! Classification precedence per entry:
//! 1. function identifier + not-found flag → `FunctionBlocked`
//! 2. function identifier alone → `FunctionPatched`
//! 3. position remap / prior-version link → informational
//! 4. anything else → `Unrecognized`, carrying the entry verbatim
//!
//! Pure and total: every entry shape maps to exactly one outcome and nothing
//! here can panic. Reporting is the caller's side effect.

use relive_core::types::{DiffEntry, PatchOutcome};

/// Classify one change-log entry.
pub fn classify_entry(entry: &DiffEntry) -> PatchOutcome {
    if let Some(name) = &entry.function_patched {
        if entry.function_info_not_found {
            return PatchOutcome::FunctionBlocked {
                name: name.clone(),
                reason: "function info not found; old code stays live".to_owned(),
            };
        }
        return PatchOutcome::FunctionPatched { name: name.clone() };
    }

    if entry.position_patched {
        return PatchOutcome::PositionOnly;
    }
    if entry.linked_to_old_script {
        return PatchOutcome::LinkedToPrior;
    }

    PatchOutcome::Unrecognized {
        raw: serde_json::to_value(entry).unwrap_or_else(|_| serde_json::Value::Null),
    }
}

/// Classify a full change log, preserving entry order.
pub fn classify(entries: &[DiffEntry]) -> Vec<PatchOutcome> {
    entries.iter().map(classify_entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn patched_entry_maps_to_function_patched() {
        let outcome = classify_entry(&DiffEntry::patched("handleRequest"));
        assert_eq!(
            outcome,
            PatchOutcome::FunctionPatched {
                name: "handleRequest".to_owned()
            }
        );
    }

    #[test]
    fn not_found_flag_wins_over_patched() {
        let outcome = classify_entry(&DiffEntry::blocked("handleRequest"));
        match outcome {
            PatchOutcome::FunctionBlocked { name, reason } => {
                assert_eq!(name, "handleRequest");
                assert!(reason.contains("old code stays live"));
            }
            other => panic!("expected blocked, got {other:?}"),
        }
    }

    #[rstest]
    #[case(DiffEntry::position_only(), PatchOutcome::PositionOnly)]
    #[case(DiffEntry::linked_to_prior(), PatchOutcome::LinkedToPrior)]
    fn informational_entries(#[case] entry: DiffEntry, #[case] expected: PatchOutcome) {
        assert_eq!(classify_entry(&entry), expected);
    }

    #[test]
    fn unknown_shape_is_surfaced_verbatim() {
        let entry: DiffEntry =
            serde_json::from_value(json!({"frames_dropped": 3, "note": "huh"})).expect("entry");
        match classify_entry(&entry) {
            PatchOutcome::Unrecognized { raw } => {
                assert_eq!(raw, json!({"frames_dropped": 3, "note": "huh"}));
            }
            other => panic!("expected unrecognized, got {other:?}"),
        }
    }

    #[test]
    fn empty_entry_is_unrecognized_not_dropped() {
        let outcomes = classify(&[DiffEntry::default()]);
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], PatchOutcome::Unrecognized { .. }));
    }

    #[test]
    fn classification_preserves_entry_order() {
        let entries = vec![
            DiffEntry::patched("a"),
            DiffEntry::position_only(),
            DiffEntry::blocked("b"),
        ];
        let outcomes = classify(&entries);
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(
            outcomes[0],
            PatchOutcome::FunctionPatched { ref name } if name == "a"
        ));
        assert_eq!(outcomes[1], PatchOutcome::PositionOnly);
        assert!(matches!(
            outcomes[2],
            PatchOutcome::FunctionBlocked { ref name, .. } if name == "b"
        ));
    }
}
