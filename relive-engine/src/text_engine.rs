//! Reference [`LivePatch`] implementation over plain text scripts.
//!
//! Tracks scripts by path and diffs old vs new source at function
//! granularity: top-most `function name(...) { ... }` blocks are extracted by
//! brace matching (string and comment syntax is not tokenized), bodies are
//! compared by value, and anything that changes the top-level shape of the
//! script rejects the patch with the recorded source left untouched.
//!
//! Per-entry semantics:
//! - body changed, same enclosing shape → `function_patched`
//! - function removed → `function_patched` + `function_info_not_found`
//! - body identical but shifted to another line → `position_patched`
//! - top-level text changed or a function added → [`PatchError::StructureChanged`]
//!
//! This is what scenario tests and simple embeddings run against; real hosts
//! implement [`LivePatch`] over their engine's primitive instead.

use std::path::{Path, PathBuf};

use relive_core::types::DiffEntry;

use crate::capability::{LivePatch, ScriptHandle};
use crate::error::PatchError;

#[derive(Debug, Clone)]
struct Script {
    path: PathBuf,
    source: String,
}

/// An in-memory script tracker with function-level live patching.
#[derive(Debug, Default)]
pub struct TextEngine {
    scripts: Vec<Script>,
}

impl TextEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a script as loaded. Re-loading a path replaces its source.
    pub fn load_script(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> ScriptHandle {
        let path = path.into();
        let source = source.into();
        if let Some(index) = self.scripts.iter().position(|s| s.path == path) {
            self.scripts[index].source = source;
            return ScriptHandle(index as u64);
        }
        self.scripts.push(Script { path, source });
        ScriptHandle((self.scripts.len() - 1) as u64)
    }

    /// Convenience lookup of the recorded source for `path`.
    pub fn source_for(&self, path: &Path) -> Option<&str> {
        self.scripts
            .iter()
            .find(|s| s.path == path)
            .map(|s| s.source.as_str())
    }
}

impl LivePatch for TextEngine {
    fn find_script(&self, path: &Path) -> Option<ScriptHandle> {
        self.scripts
            .iter()
            .position(|s| s.path == path)
            .map(|index| ScriptHandle(index as u64))
    }

    fn script_source(&self, handle: ScriptHandle) -> Option<String> {
        self.scripts
            .get(handle.0 as usize)
            .map(|s| s.source.clone())
    }

    fn set_script_source(
        &mut self,
        handle: ScriptHandle,
        new_source: &str,
    ) -> Result<Vec<DiffEntry>, PatchError> {
        let index = handle.0 as usize;
        let old_source = self
            .scripts
            .get(index)
            .map(|s| s.source.clone())
            .ok_or(PatchError::UnknownHandle(handle))?;

        let old_blocks = extract_functions(&old_source);
        let new_blocks = extract_functions(new_source);

        for block in &new_blocks {
            if !old_blocks.iter().any(|b| b.name == block.name) {
                return Err(PatchError::StructureChanged {
                    reason: format!("function '{}' added at top level", block.name),
                });
            }
        }

        let old_top = top_level_lines(&old_source, &old_blocks);
        let new_top = top_level_lines(new_source, &new_blocks);
        if old_top != new_top {
            return Err(PatchError::StructureChanged {
                reason: "top-level code changed".to_owned(),
            });
        }

        let mut entries = Vec::new();
        for old in &old_blocks {
            match new_blocks.iter().find(|b| b.name == old.name) {
                None => entries.push(DiffEntry::blocked(old.name.clone())),
                Some(new) if new.body != old.body => {
                    entries.push(DiffEntry::patched(old.name.clone()));
                }
                Some(new) if new.start_line != old.start_line => {
                    entries.push(DiffEntry::position_only());
                }
                Some(_) => {}
            }
        }

        self.scripts[index].source = new_source.to_owned();
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// Function extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct FnBlock {
    name: String,
    body: String,
    start_line: usize,
    /// Byte span of the whole block, keyword through closing brace.
    span: (usize, usize),
}

fn is_ident_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

/// Extract top-most named function blocks. Nested functions stay part of
/// their enclosing block's body, so an inner edit reports the enclosing
/// function as patched.
fn extract_functions(source: &str) -> Vec<FnBlock> {
    let bytes = source.as_bytes();
    let mut blocks = Vec::new();
    let mut i = 0usize;

    while i < source.len() {
        let Some(rel) = source[i..].find("function") else {
            break;
        };
        let start = i + rel;
        let keyword_end = start + "function".len();

        let boundary_before = start == 0 || !is_ident_char(bytes[start - 1]);
        let boundary_after =
            keyword_end < source.len() && bytes[keyword_end].is_ascii_whitespace();
        if !boundary_before || !boundary_after {
            i = keyword_end;
            continue;
        }

        let mut j = keyword_end;
        while j < source.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let name_start = j;
        while j < source.len() && is_ident_char(bytes[j]) {
            j += 1;
        }
        if j == name_start {
            // Anonymous function (the wrapper itself, callbacks); skip.
            i = keyword_end;
            continue;
        }
        let name = source[name_start..j].to_owned();

        while j < source.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= source.len() || bytes[j] != b'(' {
            i = keyword_end;
            continue;
        }
        let mut parens = 0i32;
        while j < source.len() {
            match bytes[j] {
                b'(' => parens += 1,
                b')' => {
                    parens -= 1;
                    if parens == 0 {
                        j += 1;
                        break;
                    }
                }
                _ => {}
            }
            j += 1;
        }

        while j < source.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= source.len() || bytes[j] != b'{' {
            i = keyword_end;
            continue;
        }
        let body_start = j + 1;
        let mut braces = 1i32;
        let mut k = body_start;
        while k < source.len() && braces > 0 {
            match bytes[k] {
                b'{' => braces += 1,
                b'}' => braces -= 1,
                _ => {}
            }
            k += 1;
        }
        if braces != 0 {
            i = keyword_end;
            continue;
        }

        blocks.push(FnBlock {
            name,
            body: source[body_start..k - 1].to_owned(),
            start_line: source[..start].matches('\n').count() + 1,
            span: (start, k),
        });
        i = k;
    }

    blocks
}

/// Non-empty lines that lie outside every extracted block, trimmed. This is
/// the script's top-level shape; it must be identical across a patch.
fn top_level_lines(source: &str, blocks: &[FnBlock]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut offset = 0usize;
    for line in source.split_inclusive('\n') {
        let start = offset;
        let end = offset + line.len();
        offset = end;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let inside = blocks
            .iter()
            .any(|block| start < block.span.1 && end > block.span.0);
        if !inside {
            lines.push(trimmed.to_owned());
        }
    }
    lines
}
