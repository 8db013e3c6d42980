//! Watch runtime: file registry + change detection + reload event loop.
//!
//! [`runtime::run`] wires the whole pipeline together: the registry arms one
//! notify subscription per loaded file, the freshness gate drops spurious
//! notifications, changed files flow through the transform pipeline into the
//! live patch driver, and classified outcomes are reported and published.

mod error;
pub mod freshness;
pub mod hook;
pub mod registry;
mod runtime;

pub use error::WatchError;
pub use hook::LoadHook;
pub use registry::WatchRegistry;
pub use runtime::{handles, run, start_blocking, ReloadControl, ReloadHandle, RuntimeOptions};
