//! Compile-then-wrap pipeline.
//!
//! The compile step is a collaborator seam: hosts plug in whatever
//! transpiler their module kinds need, keyed by file extension. Files with no
//! registered transform pass through [`IdentityTransform`]. The wrap step
//! reproduces the loader's original calling convention exactly; the engine's
//! recorded source is the wrapped form, and the patch driver compares against
//! it by value.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use relive_core::loader::WrapConvention;

use crate::error::TransformError;

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// One message produced by a compile step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub line: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(path: impl Into<PathBuf>, line: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{line}: {}", self.path.display(), self.message),
            None => write!(f, "{}: {}", self.path.display(), self.message),
        }
    }
}

/// Output of a compile step: executable text plus non-fatal diagnostics.
/// Ephemeral, one per reload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl TransformOutput {
    pub fn clean(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            diagnostics: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transform seam
// ---------------------------------------------------------------------------

/// A compile/transpile step for one source kind.
///
/// Implementations must not panic on bad input; rejection is
/// [`TransformError::Compile`] with diagnostics.
pub trait Transform {
    fn transform(&self, path: &Path, source: &str) -> Result<TransformOutput, TransformError>;
}

/// The default no-op compile step.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl Transform for IdentityTransform {
    fn transform(&self, _path: &Path, source: &str) -> Result<TransformOutput, TransformError> {
        Ok(TransformOutput::clean(source))
    }
}

/// Registry of compile steps keyed by lowercase file extension.
///
/// Unknown extensions fall back to the identity transform.
#[derive(Default)]
pub struct TransformSet {
    by_extension: HashMap<String, Box<dyn Transform + Send + Sync>>,
    identity: IdentityTransform,
}

impl TransformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `transform` for `extension` (without the dot). Replaces any
    /// previously registered step for the same extension.
    pub fn register(&mut self, extension: &str, transform: Box<dyn Transform + Send + Sync>) {
        self.by_extension
            .insert(extension.to_ascii_lowercase(), transform);
    }

    /// The compile step for `path`, defaulting to identity.
    pub fn for_path(&self, path: &Path) -> &(dyn Transform + Send + Sync) {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_extension.get(&ext.to_ascii_lowercase()))
            .map(|boxed| boxed.as_ref())
            .unwrap_or(&self.identity)
    }
}

impl fmt::Debug for TransformSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut extensions: Vec<&String> = self.by_extension.keys().collect();
        extensions.sort();
        f.debug_struct("TransformSet")
            .field("extensions", &extensions)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// prepare
// ---------------------------------------------------------------------------

/// Transformed, wrapped source ready for the patch driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub wrapped: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the compile step for `path` over `raw`, then wrap the output with the
/// loader's convention.
///
/// Empty raw source is skipped: editors doing write-then-rename can expose a
/// zero-length file for a moment, and patching an empty module would wipe it.
pub fn prepare(
    path: &Path,
    raw: &str,
    transforms: &TransformSet,
    convention: &WrapConvention,
) -> Result<Prepared, TransformError> {
    if raw.is_empty() {
        return Err(TransformError::EmptySource {
            path: path.to_path_buf(),
        });
    }

    let output = transforms.for_path(path).transform(path, raw)?;
    Ok(Prepared {
        wrapped: convention.wrap(&output.text),
        diagnostics: output.diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile step that rejects any source containing `boom` and rewrites
    /// `one` to `two` otherwise.
    struct RewritingTransform;

    impl Transform for RewritingTransform {
        fn transform(&self, path: &Path, source: &str) -> Result<TransformOutput, TransformError> {
            if source.contains("boom") {
                return Err(TransformError::Compile {
                    path: path.to_path_buf(),
                    diagnostics: vec![Diagnostic::new(path, Some(1), "unexpected token 'boom'")],
                });
            }
            Ok(TransformOutput::clean(source.replace("one", "two")))
        }
    }

    #[test]
    fn identity_is_the_default_for_unknown_extensions() {
        let transforms = TransformSet::new();
        let convention = WrapConvention::default();
        let prepared = prepare(Path::new("app.js"), "return 1;", &transforms, &convention)
            .expect("prepare");
        assert_eq!(prepared.wrapped, convention.wrap("return 1;"));
        assert!(prepared.diagnostics.is_empty());
    }

    #[test]
    fn registered_transform_is_applied_by_extension() {
        let mut transforms = TransformSet::new();
        transforms.register("ts", Box::new(RewritingTransform));
        let convention = WrapConvention::default();

        let prepared = prepare(Path::new("app.ts"), "return one;", &transforms, &convention)
            .expect("prepare");
        assert_eq!(prepared.wrapped, convention.wrap("return two;"));
    }

    #[test]
    fn extension_lookup_is_case_insensitive() {
        let mut transforms = TransformSet::new();
        transforms.register("TS", Box::new(RewritingTransform));

        let prepared = prepare(
            Path::new("app.ts"),
            "one",
            &transforms,
            &WrapConvention::default(),
        )
        .expect("prepare");
        assert!(prepared.wrapped.contains("two"));
    }

    #[test]
    fn compile_failure_carries_diagnostics() {
        let mut transforms = TransformSet::new();
        transforms.register("ts", Box::new(RewritingTransform));

        let err = prepare(
            Path::new("bad.ts"),
            "boom",
            &transforms,
            &WrapConvention::default(),
        )
        .expect_err("should fail");
        match err {
            TransformError::Compile { path, diagnostics } => {
                assert_eq!(path, PathBuf::from("bad.ts"));
                assert_eq!(diagnostics.len(), 1);
                assert!(diagnostics[0].to_string().contains("bad.ts:1:"));
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn empty_source_is_skipped() {
        let err = prepare(
            Path::new("app.js"),
            "",
            &TransformSet::new(),
            &WrapConvention::default(),
        )
        .expect_err("should skip");
        assert!(matches!(err, TransformError::EmptySource { .. }));
    }

    #[test]
    fn registering_twice_replaces_the_prior_step() {
        struct Upper;
        impl Transform for Upper {
            fn transform(
                &self,
                _path: &Path,
                source: &str,
            ) -> Result<TransformOutput, TransformError> {
                Ok(TransformOutput::clean(source.to_ascii_uppercase()))
            }
        }

        let mut transforms = TransformSet::new();
        transforms.register("ts", Box::new(RewritingTransform));
        transforms.register("ts", Box::new(Upper));

        let prepared = prepare(
            Path::new("app.ts"),
            "one",
            &transforms,
            &WrapConvention::default(),
        )
        .expect("prepare");
        assert!(prepared.wrapped.contains("ONE"));
    }
}
