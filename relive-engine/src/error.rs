//! Error types for relive-engine.

use thiserror::Error;

use crate::capability::ScriptHandle;

/// All errors that can arise from the live-patch primitive.
///
/// None of these terminate the watch: the runtime logs them, the watch stays
/// armed, and the previously loaded code stays live.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Top-level program structure changed; the primitive cannot relink.
    #[error("live patch blocked, structure changed: {reason}")]
    StructureChanged { reason: String },

    /// The primitive threw during apply.
    #[error("live patch rejected: {message}")]
    Rejected { message: String },

    /// The handle does not name a script the engine is tracking.
    #[error("unknown script handle {0:?}")]
    UnknownHandle(ScriptHandle),
}
