//! Human-readable reload reporting.
//!
//! One line per reloaded file, one indented line per displayed per-function
//! outcome. Rendering is pure; [`emit`] is the logging side effect. Marker
//! sets come in plain and emoji flavors, selected via
//! [`relive_core::config::LogStyle`].

use std::path::Path;

use relive_core::config::LogStyle;
use relive_core::types::{PatchOutcome, ReloadEvent};

struct Markers {
    file_reloaded: &'static str,
    function_reloaded: &'static str,
    function_blocked: &'static str,
}

const PLAIN: Markers = Markers {
    file_reloaded: "Reloading",
    function_reloaded: "[*]",
    function_blocked: "[X]",
};

const EMOJI: Markers = Markers {
    file_reloaded: "\u{1F504}",
    function_reloaded: "\u{2705}",
    function_blocked: "\u{26D4}",
};

fn markers(style: LogStyle) -> &'static Markers {
    match style {
        LogStyle::Plain => &PLAIN,
        LogStyle::Emoji => &EMOJI,
    }
}

/// Render the log lines for one reload event.
///
/// Paths are shown relative to `cwd` when possible. Informational outcomes
/// (position remaps, prior-version links) are omitted; unrecognized entries
/// are rendered verbatim so they are never silently dropped.
pub fn render(style: LogStyle, event: &ReloadEvent, cwd: &Path) -> Vec<String> {
    let m = markers(style);
    let shown = event.path.strip_prefix(cwd).unwrap_or(&event.path);

    let mut lines = vec![format!("{} {}", m.file_reloaded, shown.display())];
    for outcome in &event.outcomes {
        match outcome {
            PatchOutcome::FunctionPatched { name } => {
                lines.push(format!("\t{} {name}", m.function_reloaded));
            }
            PatchOutcome::FunctionBlocked { name, .. } => {
                lines.push(format!("\t{} {name}", m.function_blocked));
            }
            PatchOutcome::PositionOnly | PatchOutcome::LinkedToPrior => {}
            PatchOutcome::Unrecognized { raw } => {
                lines.push(format!("\t{raw}"));
            }
        }
    }
    lines
}

/// Log a reload event through the `log` facade, one line at a time.
pub fn emit(style: LogStyle, event: &ReloadEvent, cwd: &Path) {
    for line in render(style, event, cwd) {
        tracing::info!("{line}");
    }
}
