//! # relive-engine
//!
//! Live patch driver, per-function outcome classification, and reporting.
//!
//! The engine's live-patch primitive is an external collaborator behind the
//! [`LivePatch`] trait. Call [`driver::apply`] with freshly wrapped source;
//! it gates on value equality with the engine's recorded source, invokes the
//! primitive, and classifies its change log into a
//! [`relive_core::ReloadEvent`].

pub mod capability;
pub mod classify;
pub mod driver;
pub mod error;
pub mod report;
pub mod text_engine;

pub use capability::{LivePatch, NativeToggle, RuntimeVersion, ScriptHandle};
pub use classify::classify;
pub use driver::apply;
pub use error::PatchError;
pub use report::{emit, render};
pub use text_engine::TextEngine;
