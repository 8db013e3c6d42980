//! # relive-transform
//!
//! Source transform pipeline: read source already fetched by the watcher,
//! run the pluggable compile step for the file's kind, and reshape the output
//! into the loader's fixed wrapper text.
//!
//! Call [`prepare`] per reload attempt; register compile steps on a
//! [`TransformSet`].

pub mod error;
pub mod pipeline;

pub use error::TransformError;
pub use pipeline::{
    prepare, Diagnostic, IdentityTransform, Prepared, Transform, TransformOutput, TransformSet,
};
