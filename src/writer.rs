//! Atomic file writing and merge-aware artifact commits
//!
//! All mutating writes go through [`write_atomic`]: content lands in a
//! sibling temporary file first, then replaces the target via rename so a
//! crash never leaves a half-written artifact visible. Rename-over-existing
//! can fail on some platforms when the target is open or read-only; the
//! writer falls back to clearing the read-only attribute and copying over,
//! with a warning.
//!
//! [`merge_and_write`] is what makes repeated scaffold runs produce zero
//! diffs: desired fragments are deep-merged into the existing document and
//! the file is only rewritten when the serialized result actually differs.

use crate::merge::{deep_merge, ArrayStrategy};
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// What a merge-aware write actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// On-disk content already matched; nothing was written.
    Unchanged,
    /// The file did not exist and was created.
    Created,
    /// The file existed and was rewritten with merged content.
    Updated,
}

impl WriteOutcome {
    pub fn wrote(&self) -> bool {
        !matches!(self, WriteOutcome::Unchanged)
    }
}

/// Options for [`merge_and_write`].
#[derive(Debug, Clone)]
pub struct MergeWriteOptions {
    pub array_strategy: ArrayStrategy,
    /// Directory for collision-safe per-file backups of files being replaced.
    /// `None` disables the per-file backup.
    pub backup_dir: Option<PathBuf>,
}

impl Default for MergeWriteOptions {
    fn default() -> Self {
        Self {
            array_strategy: ArrayStrategy::AppendUnique,
            backup_dir: None,
        }
    }
}

/// Serialization format for structured artifacts, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocFormat {
    Json,
    Yaml,
}

fn format_for(path: &Path) -> DocFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yml") | Some("yaml") => DocFormat::Yaml,
        _ => DocFormat::Json,
    }
}

/// Writes `content` to `path` through a sibling temp file + rename.
///
/// On rename failure the writer clears a read-only attribute on the target,
/// copies the temp file over it, and removes the temp file. The temp file
/// never survives, on success or failure.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&parent)
        .with_context(|| format!("failed to create parent directory {}", parent.display()))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact");
    let tmp = parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

    if let Err(e) = fs::write(&tmp, content) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("failed to write temp file for {}", path.display()));
    }

    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            warn!(
                path = %path.display(),
                error = %rename_err,
                "atomic rename failed, falling back to copy-overwrite"
            );

            // Clear a read-only attribute that can block the overwrite.
            if let Ok(metadata) = fs::metadata(path) {
                let mut perms = metadata.permissions();
                if perms.readonly() {
                    #[allow(clippy::permissions_set_readonly_false)]
                    perms.set_readonly(false);
                    let _ = fs::set_permissions(path, perms);
                }
            }

            let copy_result = fs::copy(&tmp, path);
            let _ = fs::remove_file(&tmp);
            copy_result
                .map(|_| ())
                .with_context(|| format!("failed to replace {}", path.display()))
        }
    }
}

/// Produces a collision-safe timestamped backup copy of `path` inside
/// `backup_dir`. Sub-second precision plus a random suffix tolerates rapid
/// repeated writes within the same second.
pub fn backup_file(path: &Path, backup_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(backup_dir)
        .with_context(|| format!("failed to create backup dir {}", backup_dir.display()))?;

    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact");
    let dest = backup_dir.join(format!("{file_name}.{stamp}.{suffix}.bak"));

    fs::copy(path, &dest)
        .with_context(|| format!("failed to back up {} to {}", path.display(), dest.display()))?;
    debug!(from = %path.display(), to = %dest.display(), "per-file backup created");
    Ok(dest)
}

/// Loads the existing structured document at `path`.
///
/// Absent files yield an empty object. A malformed file is backed up (when a
/// backup dir is available) and treated as empty; the returned flag reports
/// that a malformed document was replaced so callers can surface a warning.
fn load_existing(path: &Path, options: &MergeWriteOptions) -> (Value, bool) {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return (Value::Object(Default::default()), false),
    };

    let parsed = match format_for(path) {
        DocFormat::Json => {
            let cleaned = crate::config::strip_trailing_commas(
                &crate::config::strip_jsonc_comments(&raw),
            );
            serde_json::from_str::<Value>(&cleaned).ok()
        }
        DocFormat::Yaml => serde_yaml::from_str::<Value>(&raw).ok(),
    };

    match parsed {
        Some(v @ Value::Object(_)) => (v, false),
        _ => {
            warn!(path = %path.display(), "existing file is not a structured document, treating as empty");
            if let Some(backup_dir) = &options.backup_dir {
                if let Err(e) = backup_file(path, backup_dir) {
                    warn!(path = %path.display(), error = %e, "failed to back up malformed file");
                }
            }
            (Value::Object(Default::default()), true)
        }
    }
}

fn serialize(path: &Path, value: &Value) -> Result<String> {
    let mut out = match format_for(path) {
        DocFormat::Json => serde_json::to_string_pretty(value)
            .with_context(|| format!("failed to serialize {}", path.display()))?,
        DocFormat::Yaml => serde_yaml::to_string(value)
            .with_context(|| format!("failed to serialize {}", path.display()))?,
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

/// Result of [`merge_and_write`]: the outcome plus whether a malformed
/// existing document had to be discarded (surfaced as a warning upstream).
#[derive(Debug, Clone, Copy)]
pub struct MergeWriteResult {
    pub outcome: WriteOutcome,
    pub replaced_malformed: bool,
}

/// Deep-merges `desired` into the structured document at `path` and commits
/// the result atomically — but only if the serialized content differs from
/// what is already on disk (after line-ending normalization).
pub fn merge_and_write(
    path: &Path,
    desired: &Value,
    options: &MergeWriteOptions,
) -> Result<MergeWriteResult> {
    let existed = path.exists();
    let (existing, replaced_malformed) = if existed {
        load_existing(path, options)
    } else {
        (Value::Object(Default::default()), false)
    };

    let merged = deep_merge(&existing, desired, options.array_strategy);
    let serialized = serialize(path, &merged)?;

    if existed {
        if let Ok(current) = fs::read_to_string(path) {
            if normalize_line_endings(&current) == normalize_line_endings(&serialized) {
                debug!(path = %path.display(), "content unchanged, skipping write");
                return Ok(MergeWriteResult {
                    outcome: WriteOutcome::Unchanged,
                    replaced_malformed,
                });
            }
        }
    }

    if existed && !replaced_malformed {
        if let Some(backup_dir) = &options.backup_dir {
            if let Err(e) = backup_file(path, backup_dir) {
                warn!(path = %path.display(), error = %e, "per-file backup failed");
            }
        }
    }

    write_atomic(path, &serialized)?;
    Ok(MergeWriteResult {
        outcome: if existed {
            WriteOutcome::Updated
        } else {
            WriteOutcome::Created
        },
        replaced_malformed,
    })
}

/// Merges `desired` text into the text file at `path` with the line-append
/// policy and commits atomically when the content differs.
pub fn merge_and_write_text(path: &Path, desired: &str) -> Result<WriteOutcome> {
    let existed = path.exists();
    let existing = if existed {
        fs::read_to_string(path).unwrap_or_default()
    } else {
        String::new()
    };

    let merged = crate::merge::merge_text_lines(&existing, desired);

    if existed && normalize_line_endings(&existing) == normalize_line_endings(&merged) {
        debug!(path = %path.display(), "text content unchanged, skipping write");
        return Ok(WriteOutcome::Unchanged);
    }

    write_atomic(path, &merged)?;
    Ok(if existed {
        WriteOutcome::Updated
    } else {
        WriteOutcome::Created
    })
}
