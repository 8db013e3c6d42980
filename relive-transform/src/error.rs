//! Error types for relive-transform.

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::Diagnostic;

/// All errors that can arise from a transform attempt.
///
/// None of these are fatal to the watch loop: the caller logs the diagnostics,
/// skips the reload for this event, and the previously loaded code stays live.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The compile step rejected the source.
    #[error("compile failed for {} ({} diagnostic(s))", path.display(), diagnostics.len())]
    Compile {
        path: PathBuf,
        diagnostics: Vec<Diagnostic>,
    },

    /// The file read back empty, typically mid-save; skip this cycle.
    #[error("empty source read for {}", path.display())]
    EmptySource { path: PathBuf },
}
