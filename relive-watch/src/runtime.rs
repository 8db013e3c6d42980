//! Reload runtime: the event loop tying registry, change detection,
//! transform, patch driver, and reporting together.
//!
//! Single-threaded and event-driven: reads and status probes are async
//! suspension points, the patch primitive call is synchronous and atomic, and
//! reload processing is serialized by the loop itself: an event arriving
//! while a prior reload for the same path is in flight queues behind it and
//! is then absorbed by the debounce and the driver's value-equality gate.
//!
//! Nothing here may terminate the host process: every per-event failure is
//! logged and the watch stays armed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use notify::EventKind;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use relive_core::config::{self, FreshnessStrategy, ReloadConfig};
use relive_core::loader::{LoadedModule, Loader, WrapConvention};
use relive_core::types::ReloadEvent;
use relive_engine::capability::{LivePatch, NativeToggle, RuntimeVersion};
use relive_engine::{driver, report};
use relive_transform::{pipeline, TransformError, TransformSet};

use crate::error::WatchError;
use crate::freshness::{self, Freshness};
use crate::hook::LoadHook;
use crate::registry::WatchRegistry;

/// Everything the reload runtime needs from its host.
pub struct RuntimeOptions {
    /// Home directory holding `.relive/config.yaml`.
    pub home: PathBuf,
    /// The host's module loader.
    pub loader: Box<dyn Loader + Send>,
    /// The engine live-patch capability, when the host has one. `None`
    /// disables the subsystem for the process lifetime.
    pub engine: Option<Box<dyn LivePatch + Send>>,
    /// Optional native facility widening runtime-version support.
    pub toggle: Option<Box<dyn NativeToggle + Send>>,
    /// Host runtime version, used to decide whether the toggle is needed.
    pub runtime_version: Option<RuntimeVersion>,
    /// Compile steps keyed by file extension.
    pub transforms: TransformSet,
    /// Programmatic subscriber for classified reload events.
    pub events: Option<mpsc::UnboundedSender<ReloadEvent>>,
}

/// Host-side handle: the load hook plus shutdown.
pub struct ReloadHandle {
    hook: LoadHook,
    shutdown: broadcast::Sender<()>,
}

impl ReloadHandle {
    /// The observer the host's loader calls after each successful resolve.
    pub fn hook(&self) -> LoadHook {
        self.hook.clone()
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }
}

/// Runtime-side ends of the host channels.
pub struct ReloadControl {
    loads: mpsc::UnboundedReceiver<LoadedModule>,
    shutdown: broadcast::Receiver<()>,
}

/// Create the paired host handle and runtime control.
pub fn handles() -> (ReloadHandle, ReloadControl) {
    let (load_tx, load_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(16);
    (
        ReloadHandle {
            hook: LoadHook::new(load_tx),
            shutdown: shutdown_tx,
        },
        ReloadControl {
            loads: load_rx,
            shutdown: shutdown_rx,
        },
    )
}

/// Start the reload runtime on a current-thread tokio runtime and block until
/// it exits.
pub fn start_blocking(options: RuntimeOptions, control: ReloadControl) -> Result<(), WatchError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| crate::error::io_err("tokio-runtime", e))?;
    runtime.block_on(run(options, control))
}

/// Run the reload runtime.
pub async fn run(mut options: RuntimeOptions, mut control: ReloadControl) -> Result<(), WatchError> {
    let config = config::load_at(&options.home)?;

    let toggle: Option<&mut (dyn NativeToggle + Send)> = match options.toggle.as_mut() {
        Some(t) => Some(t.as_mut()),
        None => None,
    };
    let native = enable_native_toggle(options.runtime_version, toggle);

    // Capability detection happens exactly once, here. Absent capability
    // disables the subsystem for the process lifetime instead of failing on
    // every event.
    let Some(mut engine) = options.engine else {
        tracing::warn!("live patch capability unavailable; hot reload disabled");
        return Ok(());
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut registry = WatchRegistry::new(config.clone(), event_tx)?;
    registry.watch_all(options.loader.as_ref());

    let convention = options.loader.wrap_convention();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut debounce = HashMap::<PathBuf, Instant>::new();

    tracing::info!(
        watched = registry.len(),
        native,
        "live reload activated"
    );

    loop {
        tokio::select! {
            _ = control.shutdown.recv() => break,
            module = control.loads.recv() => {
                let Some(module) = module else { break };
                match registry.watch(&module) {
                    Ok(true) => tracing::info!(module = %module.id, "watching newly loaded module"),
                    Ok(false) => {}
                    Err(err) => {
                        tracing::warn!(module = %module.id, error = %err, "failed to watch loaded module");
                    }
                }
            }
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(error = %err, "watcher event error");
                        continue;
                    }
                };
                if !is_relevant_event_kind(&event.kind) {
                    continue;
                }
                for path in event.paths {
                    let path = std::fs::canonicalize(&path).unwrap_or(path);
                    if !registry.is_watched(&path) {
                        continue;
                    }
                    if !freshness::should_process_event(
                        &mut debounce,
                        &path,
                        Instant::now(),
                        config.debounce_window(),
                    ) {
                        continue;
                    }
                    reload_path(
                        &path,
                        &mut registry,
                        &config,
                        &options.transforms,
                        &convention,
                        engine.as_mut(),
                        options.events.as_ref(),
                        &cwd,
                    )
                    .await;
                }
            }
        }
    }

    Ok(())
}

/// One reload attempt for one path. Infallible by design: every failure mode
/// here means "this reload did nothing" plus a log line.
#[allow(clippy::too_many_arguments)]
async fn reload_path(
    path: &Path,
    registry: &mut WatchRegistry,
    config: &ReloadConfig,
    transforms: &TransformSet,
    convention: &WrapConvention,
    engine: &mut (dyn LivePatch + Send),
    events: Option<&mpsc::UnboundedSender<ReloadEvent>>,
    cwd: &Path,
) {
    {
        let Some(entry) = registry.entry_mut(path) else {
            return;
        };
        if freshness::pre_read_gate(config.freshness, entry).await == Freshness::Unchanged {
            tracing::debug!(path = %path.display(), "notification without content change");
            return;
        }
    }

    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) => {
            // Mid-save rename; the follow-up event carries the real content.
            tracing::debug!(path = %path.display(), error = %err, "read failed; no change");
            return;
        }
    };

    if config.freshness == FreshnessStrategy::Digest {
        let Some(entry) = registry.entry_mut(path) else {
            return;
        };
        if freshness::observe_digest(entry, &raw) == Freshness::Unchanged {
            tracing::debug!(path = %path.display(), "content digest unchanged");
            return;
        }
    }

    let prepared = match pipeline::prepare(path, &raw, transforms, convention) {
        Ok(prepared) => prepared,
        Err(TransformError::Compile { diagnostics, .. }) => {
            tracing::warn!(path = %path.display(), "compile failed; previously loaded code stays live");
            for diagnostic in diagnostics {
                tracing::warn!("{diagnostic}");
            }
            return;
        }
        Err(TransformError::EmptySource { .. }) => {
            tracing::debug!(path = %path.display(), "empty read; skipping this cycle");
            return;
        }
    };
    for diagnostic in &prepared.diagnostics {
        tracing::warn!("{diagnostic}");
    }

    match driver::apply(engine, path, &prepared.wrapped) {
        Ok(None) => {}
        Ok(Some(event)) => {
            report::emit(config.log_style, &event, cwd);
            if let Some(tx) = events {
                let _ = tx.send(event);
            }
        }
        Err(err) => {
            tracing::error!(
                path = %path.display(),
                error = %err,
                "live patch failed; previously loaded code stays live",
            );
        }
    }
}

fn enable_native_toggle(
    version: Option<RuntimeVersion>,
    toggle: Option<&mut (dyn NativeToggle + Send)>,
) -> bool {
    let Some(version) = version else {
        return false;
    };
    if !version.needs_native_toggle() {
        return false;
    }
    match toggle {
        None => {
            tracing::warn!(%version, "runtime needs the native toggle but none was provided");
            false
        }
        Some(toggle) => match toggle.enable() {
            Ok(enabled) => enabled,
            Err(err) => {
                tracing::warn!(%version, error = %err, "native toggle failed; continuing without it");
                false
            }
        },
    }
}

fn is_relevant_event_kind(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
