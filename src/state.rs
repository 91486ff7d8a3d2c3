//! Hash-based state store
//!
//! Persists a version-stamped snapshot of tracked-file digests plus the
//! detected stacks and tool states at `.precursor/state.json`. The snapshot
//! is read at the start of a run to decide whether tracked inputs changed and
//! rewritten at the end of a successful run.
//!
//! A state file that is missing, unparsable, or carries a different schema
//! version is treated as absent — the run falls back to a full rescan, never
//! to stale trust.

use crate::detect::Stack;
use crate::tools::ToolResult;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Bumped whenever the snapshot layout changes. Mismatched snapshots are
/// discarded wholesale, never partially trusted.
pub const STATE_SCHEMA_VERSION: u32 = 2;

/// Directory under the workspace root holding precursor's own files.
pub const PRECURSOR_DIR: &str = ".precursor";

const STATE_FILE: &str = "state.json";

/// The persisted cache enabling idempotent re-runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub version: u32,
    pub last_update: DateTime<Utc>,
    /// Workspace-relative path (forward slashes) to content digest.
    pub hashes: BTreeMap<String, String>,
    pub stacks: BTreeSet<Stack>,
    /// Tool states cached for reporting only — never trusted as ground truth
    /// for the next run's decisions.
    pub tools: BTreeMap<String, ToolResult>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self {
            version: STATE_SCHEMA_VERSION,
            last_update: Utc::now(),
            hashes: BTreeMap::new(),
            stacks: BTreeSet::new(),
            tools: BTreeMap::new(),
        }
    }
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads and saves [`StateSnapshot`]s for one workspace root.
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(PRECURSOR_DIR).join(STATE_FILE)
    }

    /// Returns the prior snapshot, or `None` when the file is missing,
    /// unparsable, or carries a mismatched schema version.
    pub fn load(&self) -> Option<StateSnapshot> {
        let path = self.state_path();
        let raw = fs::read_to_string(&path).ok()?;

        let snapshot: StateSnapshot = match serde_json::from_str(&raw) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "state file unparsable, treating as absent");
                return None;
            }
        };

        if snapshot.version != STATE_SCHEMA_VERSION {
            warn!(
                found = snapshot.version,
                expected = STATE_SCHEMA_VERSION,
                "state schema version mismatch, treating as absent"
            );
            return None;
        }

        debug!(tracked = snapshot.hashes.len(), "loaded prior state");
        Some(snapshot)
    }

    /// Persists the snapshot through the atomic writer so a concurrently
    /// starting run never observes a half-written state file.
    pub fn save(&self, snapshot: &StateSnapshot) -> Result<()> {
        let serialized = serde_json::to_string_pretty(snapshot)
            .context("failed to serialize state snapshot")?;
        crate::writer::write_atomic(&self.state_path(), &serialized)
    }

    /// Removes the state file, forcing a full rescan on the next run.
    pub fn reset(&self) -> Result<()> {
        let path = self.state_path();
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove state file {}", path.display()))?;
        }
        Ok(())
    }

    /// Strong content digest used to gate rewrites of generated content.
    pub fn compute_hash(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    /// Digest of the file at a workspace-relative path, if it exists and is
    /// readable.
    pub fn hash_file(&self, rel_path: &str) -> Option<String> {
        let bytes = fs::read(self.root.join(rel_path)).ok()?;
        Some(Self::compute_hash(&bytes))
    }

    /// Whether the tracked file at `rel_path` changed since `prior`.
    ///
    /// A path that no longer exists counts as changed iff a digest was
    /// previously stored — deletion is a change.
    pub fn has_changed(&self, prior: &StateSnapshot, rel_path: &str) -> bool {
        match (self.hash_file(rel_path), prior.hashes.get(rel_path)) {
            (Some(current), Some(stored)) => current != *stored,
            (Some(_), None) => true,
            (None, Some(_)) => true,
            (None, None) => false,
        }
    }
}
