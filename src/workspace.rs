//! Workspace root resolution
//!
//! Stacks are detected and artifacts are written relative to exactly one
//! workspace root per run. The root is always an explicit parameter threaded
//! through the components, never ambient process state, so everything stays
//! testable against temp directories.

use crate::config::{PrecursorConfig, WorkspaceMode};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves the workspace root for a run.
///
/// Precedence:
/// 1. explicit `workspace.root` from configuration
/// 2. the invocation directory when `workspace.mode` is `subproject`
/// 3. the nearest ancestor containing `.git`, when discoverable
/// 4. the invocation directory
pub fn resolve_root(invocation_dir: &Path, config: &PrecursorConfig) -> Result<PathBuf> {
    let root = if let Some(explicit) = &config.workspace.root {
        let absolute = if explicit.is_absolute() {
            explicit.clone()
        } else {
            invocation_dir.join(explicit)
        };
        debug!(root = %absolute.display(), "using explicit workspace root");
        absolute
    } else if config.workspace.mode == WorkspaceMode::Subproject {
        debug!(root = %invocation_dir.display(), "subproject mode, using invocation directory");
        invocation_dir.to_path_buf()
    } else if let Some(vcs_root) = find_vcs_root(invocation_dir) {
        debug!(root = %vcs_root.display(), "using version-control root");
        vcs_root
    } else {
        debug!(root = %invocation_dir.display(), "no VCS root found, using invocation directory");
        invocation_dir.to_path_buf()
    };

    if !root.is_dir() {
        anyhow::bail!("workspace root is not a directory: {}", root.display());
    }

    root.canonicalize()
        .with_context(|| format!("failed to canonicalize workspace root {}", root.display()))
}

/// Walks up from `start` looking for a `.git` entry (directory or worktree
/// file). Returns the containing directory if found.
pub fn find_vcs_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}
