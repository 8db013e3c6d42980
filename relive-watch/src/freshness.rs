//! Change detection: freshness probes and notification debounce.
//!
//! Filesystem watchers fire several notifications per logical save; the
//! debounce map collapses bursts, and the freshness probe drops events whose
//! content did not meaningfully change. A failed status query is "no change":
//! atomic-save editors briefly remove the path while renaming the new file
//! into place, and the follow-up event carries the real content.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::time::Instant;

use relive_core::config::FreshnessStrategy;
use relive_core::types::WatchedFile;

/// Verdict of a freshness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Changed,
    Unchanged,
}

/// Probe the file's modification time and update the watch marker.
///
/// `Unchanged` when the stat fails or the mtime matches the last recorded one.
pub async fn probe_mtime(file: &mut WatchedFile) -> Freshness {
    let mtime = match tokio::fs::metadata(&file.path).await {
        Ok(meta) => match meta.modified() {
            Ok(mtime) => mtime,
            Err(_) => return Freshness::Unchanged,
        },
        Err(_) => return Freshness::Unchanged,
    };

    if file.mtime == Some(mtime) {
        return Freshness::Unchanged;
    }
    file.mtime = Some(mtime);
    Freshness::Changed
}

/// Compare `contents` against the last recorded digest and update the marker.
pub fn observe_digest(file: &mut WatchedFile, contents: &str) -> Freshness {
    let digest = content_digest(contents);
    if file.digest.as_deref() == Some(digest.as_str()) {
        return Freshness::Unchanged;
    }
    file.digest = Some(digest);
    Freshness::Changed
}

/// Hex SHA-256 of file content.
pub fn content_digest(contents: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents.as_bytes());
    hex::encode(hasher.finalize())
}

/// Apply the configured strategy. The mtime strategy probes before the file
/// is read; the digest strategy is applied by the caller after reading.
pub async fn pre_read_gate(strategy: FreshnessStrategy, file: &mut WatchedFile) -> Freshness {
    match strategy {
        FreshnessStrategy::Mtime => probe_mtime(file).await,
        // Digest needs content; decided post-read.
        FreshnessStrategy::Digest => Freshness::Changed,
    }
}

// ---------------------------------------------------------------------------
// Debounce
// ---------------------------------------------------------------------------

/// Whether an event for `path` should be processed now, given the last time
/// one was. Entries older than 30s are dropped to bound the map.
pub fn should_process_event(
    debounce: &mut HashMap<PathBuf, Instant>,
    path: &Path,
    now: Instant,
    threshold: Duration,
) -> bool {
    debounce.retain(|_, seen_at| now.duration_since(*seen_at) <= Duration::from_secs(30));
    match debounce.get(path) {
        Some(last_seen) if now.duration_since(*last_seen) < threshold => false,
        _ => {
            debounce.insert(path.to_path_buf(), now);
            true
        }
    }
}
