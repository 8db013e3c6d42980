//! Relive core library: domain types, reload configuration, loader seam.
//!
//! Public API surface:
//! - [`types`]: newtypes, diff entries, per-function reload outcomes
//! - [`loader`]: the host-loader abstraction and module wrap convention
//! - [`config`]: YAML reload configuration under `~/.relive/`
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod loader;
pub mod types;

pub use config::{FreshnessStrategy, LogStyle, ReloadConfig};
pub use error::ConfigError;
pub use loader::{LoadedModule, Loader, StaticLoader, WrapConvention};
pub use types::{DiffEntry, ModuleId, PatchOutcome, ReloadEvent, WatchedFile};
