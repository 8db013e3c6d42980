//! Reload configuration, persisted as YAML.
//!
//! # Storage layout
//!
//! ```text
//! ~/.relive/
//!   config.yaml
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path)`: explicit home; used in tests with `TempDir`
//! - `fn()`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default debounce window for coalescing filesystem notifications.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Marker set used by the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogStyle {
    Plain,
    #[default]
    Emoji,
}

/// How the change detector decides whether on-disk content meaningfully
/// changed since the last check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessStrategy {
    /// Track modification time via async stat; a failed stat is "no change"
    /// (atomic-save editors briefly remove the path during rename).
    #[default]
    Mtime,
    /// Track a SHA-256 digest of file content.
    Digest,
}

/// Configuration for the watch runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    pub log_style: LogStyle,
    pub debounce_ms: u64,
    pub freshness: FreshnessStrategy,
    /// File extensions eligible for watching, lowercase without the dot.
    pub extensions: Vec<String>,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            log_style: LogStyle::default(),
            debounce_ms: DEBOUNCE_WINDOW.as_millis() as u64,
            freshness: FreshnessStrategy::default(),
            extensions: vec!["js".to_owned(), "ts".to_owned()],
        }
    }
}

impl ReloadConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Whether `path` carries one of the configured extensions.
    pub fn watches_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

/// `<home>/.relive/config.yaml`; pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".relive").join("config.yaml")
}

/// Load the reload config, falling back to defaults when the file is absent.
pub fn load_at(home: &Path) -> Result<ReloadConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(ReloadConfig::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<ReloadConfig, ConfigError> {
    load_at(&home()?)
}

/// Save the reload config atomically (`.tmp` + rename).
pub fn save_at(home: &Path, config: &ReloadConfig) -> Result<(), ConfigError> {
    let path = config_path_at(home);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let yaml = serde_yaml::to_string(config)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(config: &ReloadConfig) -> Result<(), ConfigError> {
    save_at(&home()?, config)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_config_file_missing() {
        let home = TempDir::new().expect("home");
        let config = load_at(home.path()).expect("load");
        assert_eq!(config, ReloadConfig::default());
        assert_eq!(config.debounce_window(), DEBOUNCE_WINDOW);
    }

    #[test]
    fn roundtrip_save_load() {
        let home = TempDir::new().expect("home");
        let config = ReloadConfig {
            log_style: LogStyle::Plain,
            debounce_ms: 250,
            freshness: FreshnessStrategy::Digest,
            extensions: vec!["lua".to_owned()],
        };
        save_at(home.path(), &config).expect("save");
        let loaded = load_at(home.path()).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let home = TempDir::new().expect("home");
        save_at(home.path(), &ReloadConfig::default()).expect("save");
        let tmp = config_path_at(home.path()).with_extension("yaml.tmp");
        assert!(!tmp.exists(), "tmp file should be removed after rename");
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let home = TempDir::new().expect("home");
        let path = config_path_at(home.path());
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "log_style: plain\n").expect("write");

        let config = load_at(home.path()).expect("load");
        assert_eq!(config.log_style, LogStyle::Plain);
        assert_eq!(config.debounce_ms, ReloadConfig::default().debounce_ms);
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let home = TempDir::new().expect("home");
        let path = config_path_at(home.path());
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "log_style: [nope\n").expect("write");

        let err = load_at(home.path()).expect_err("should fail");
        match err {
            ConfigError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[rstest]
    #[case("lib/app.js", true)]
    #[case("lib/app.ts", true)]
    #[case("lib/APP.JS", true)]
    #[case("lib/styles.css", false)]
    #[case("Makefile", false)]
    fn extension_filter(#[case] path: &str, #[case] watched: bool) {
        let config = ReloadConfig::default();
        assert_eq!(config.watches_path(Path::new(path)), watched);
    }
}
