//! Host-loader abstraction.
//!
//! The loader collaborator owns the loaded-module cache and the fixed wrapper
//! text every module was compiled with at load time. The reload pipeline must
//! reproduce that wrapper byte for byte: the engine compares freshly wrapped
//! source against its recorded source by value, and a one-byte mismatch means
//! a spurious patch attempt on every cycle.

use std::path::PathBuf;

use crate::types::ModuleId;

/// One entry of the host loader's module cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    pub id: ModuleId,
    pub path: PathBuf,
}

impl LoadedModule {
    pub fn new(id: impl Into<ModuleId>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

/// The fixed prologue/epilogue the loader wraps module source with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapConvention {
    pub prologue: String,
    pub epilogue: String,
}

/// CommonJS wrapper prologue, reproduced exactly.
pub const COMMONJS_PROLOGUE: &str =
    "(function (exports, require, module, __filename, __dirname) { ";
/// CommonJS wrapper epilogue, reproduced exactly.
pub const COMMONJS_EPILOGUE: &str = "\n});";

impl Default for WrapConvention {
    fn default() -> Self {
        Self {
            prologue: COMMONJS_PROLOGUE.to_owned(),
            epilogue: COMMONJS_EPILOGUE.to_owned(),
        }
    }
}

impl WrapConvention {
    /// Wrap executable source in the loader's calling convention.
    pub fn wrap(&self, source: &str) -> String {
        let mut wrapped =
            String::with_capacity(self.prologue.len() + source.len() + self.epilogue.len());
        wrapped.push_str(&self.prologue);
        wrapped.push_str(source);
        wrapped.push_str(&self.epilogue);
        wrapped
    }

    /// Strip the wrapper from previously wrapped source.
    ///
    /// Returns `None` when `wrapped` does not carry this convention.
    pub fn unwrap<'a>(&self, wrapped: &'a str) -> Option<&'a str> {
        wrapped
            .strip_prefix(self.prologue.as_str())?
            .strip_suffix(self.epilogue.as_str())
    }
}

/// The seam between the reload pipeline and the host's module loader.
///
/// Hosts implement this over their real loader. The resolution entry point is
/// not patched; instead the host calls the watch runtime's load hook after
/// each successful resolve (see `relive-watch`).
pub trait Loader {
    /// Snapshot of the currently loaded module cache.
    fn loaded_modules(&self) -> Vec<LoadedModule>;

    /// The wrapper convention modules were loaded with.
    fn wrap_convention(&self) -> WrapConvention {
        WrapConvention::default()
    }
}

/// A [`Loader`] backed by an explicit module list. Used in tests and by
/// embeddings that register their modules up front.
#[derive(Debug, Default)]
pub struct StaticLoader {
    modules: Vec<LoadedModule>,
    convention: WrapConvention,
}

impl StaticLoader {
    pub fn new(modules: Vec<LoadedModule>) -> Self {
        Self {
            modules,
            convention: WrapConvention::default(),
        }
    }

    pub fn with_convention(mut self, convention: WrapConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn add(&mut self, module: LoadedModule) {
        self.modules.push(module);
    }
}

impl Loader for StaticLoader {
    fn loaded_modules(&self) -> Vec<LoadedModule> {
        self.modules.clone()
    }

    fn wrap_convention(&self) -> WrapConvention {
        self.convention.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_reproduces_commonjs_convention_exactly() {
        let convention = WrapConvention::default();
        let wrapped = convention.wrap("return 1;");
        assert_eq!(
            wrapped,
            "(function (exports, require, module, __filename, __dirname) { return 1;\n});"
        );
    }

    #[test]
    fn unwrap_inverts_wrap() {
        let convention = WrapConvention::default();
        let source = "const x = 1;\nmodule.exports = x;\n";
        assert_eq!(convention.unwrap(&convention.wrap(source)), Some(source));
    }

    #[test]
    fn unwrap_rejects_foreign_text() {
        let convention = WrapConvention::default();
        assert_eq!(convention.unwrap("console.log(1)"), None);
    }

    #[test]
    fn static_loader_returns_registered_modules() {
        let mut loader = StaticLoader::default();
        loader.add(LoadedModule::new("app", "/srv/app.js"));
        let modules = loader.loaded_modules();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].id, ModuleId::from("app"));
    }
}
