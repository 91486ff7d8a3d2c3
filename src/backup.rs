//! Backup and rollback of managed artifacts
//!
//! Before any mutating run, every managed artifact currently present on disk
//! is copied verbatim into a timestamp-named snapshot directory under
//! `.precursor/backups/`. Snapshots are append-only, totally ordered by
//! creation time, and only the newest one is used for rollback. A retention
//! policy prunes the oldest snapshots beyond the configured maximum.
//!
//! Backups are a safety net, not a precondition: an individual artifact copy
//! failure is logged and skipped. Only failure to create the snapshot root
//! itself aborts, because scaffolding must not proceed with the safety net
//! silently missing.

use crate::config::PrecursorConfig;
use crate::scaffold::artifacts::MANAGED_PATHS;
use crate::state::PRECURSOR_DIR;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const BACKUPS_DIR: &str = "backups";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("no backup snapshots found under {0}")]
    NoBackupFound(PathBuf),

    #[error("failed to create snapshot root {path}: {source}")]
    SnapshotRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to restore {path}: {source}")]
    Restore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of a successful rollback.
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    pub snapshot_id: String,
    pub restored: Vec<String>,
}

/// Owns the backup root for one workspace.
pub struct BackupManager {
    root: PathBuf,
}

impl BackupManager {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn backups_root(&self) -> PathBuf {
        self.root.join(PRECURSOR_DIR).join(BACKUPS_DIR)
    }

    /// Snapshots every managed artifact currently present on disk into a new
    /// timestamped directory and returns its id.
    ///
    /// Returns an empty id without touching the filesystem when backups are
    /// disabled. Individual artifact copy failures are logged and skipped;
    /// failure to create the snapshot root is an error.
    pub fn snapshot(&self, config: &PrecursorConfig) -> Result<String, BackupError> {
        if !config.backup.enabled {
            debug!("backups disabled, skipping snapshot");
            return Ok(String::new());
        }

        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
        // Rapid repeated snapshots can land in the same millisecond.
        let mut snapshot_id = stamp.clone();
        let mut counter = 1;
        while self.backups_root().join(&snapshot_id).exists() {
            snapshot_id = format!("{stamp}-{counter}");
            counter += 1;
        }
        let snapshot_dir = self.backups_root().join(&snapshot_id);
        fs::create_dir_all(&snapshot_dir).map_err(|source| BackupError::SnapshotRoot {
            path: snapshot_dir.clone(),
            source,
        })?;

        let mut copied = 0usize;
        for rel in MANAGED_PATHS {
            let live = self.root.join(rel);
            if !live.exists() {
                continue;
            }
            let dest = snapshot_dir.join(rel);
            if let Err(e) = copy_recursive(&live, &dest) {
                warn!(artifact = rel, error = %e, "failed to back up artifact, continuing");
                continue;
            }
            copied += 1;
        }

        info!(snapshot = %snapshot_id, artifacts = copied, "backup snapshot created");
        self.prune(config);
        Ok(snapshot_id)
    }

    /// Restores the most recent snapshot wholesale.
    ///
    /// Every managed artifact present inside the snapshot overwrites the
    /// corresponding live path (directories are removed then copied, files
    /// copied over). Artifacts absent from the snapshot are left untouched —
    /// restore never deletes files that were not part of the set at snapshot
    /// time.
    pub fn restore_latest(&self) -> Result<RestoreOutcome, BackupError> {
        let snapshots = self.list_snapshots();
        let (snapshot_id, snapshot_dir) = snapshots
            .last()
            .cloned()
            .ok_or_else(|| BackupError::NoBackupFound(self.backups_root()))?;

        let mut restored = Vec::new();
        for rel in MANAGED_PATHS {
            let saved = snapshot_dir.join(rel);
            if !saved.exists() {
                continue;
            }
            let live = self.root.join(rel);

            if live.is_dir() {
                fs::remove_dir_all(&live).map_err(|source| BackupError::Restore {
                    path: live.clone(),
                    source,
                })?;
            }
            copy_recursive(&saved, &live).map_err(|source| BackupError::Restore {
                path: live.clone(),
                source,
            })?;
            restored.push(rel.to_string());
        }

        info!(snapshot = %snapshot_id, artifacts = restored.len(), "rollback complete");
        Ok(RestoreOutcome {
            snapshot_id,
            restored,
        })
    }

    /// Deletes the oldest snapshots beyond `backup.max_backups`, oldest
    /// first. Never fails the run; deletion problems are warnings.
    pub fn prune(&self, config: &PrecursorConfig) {
        let snapshots = self.list_snapshots();
        if snapshots.len() <= config.backup.max_backups {
            return;
        }

        let excess = snapshots.len() - config.backup.max_backups;
        for (id, dir) in snapshots.into_iter().take(excess) {
            match fs::remove_dir_all(&dir) {
                Ok(()) => debug!(snapshot = %id, "pruned old snapshot"),
                Err(e) => warn!(snapshot = %id, error = %e, "failed to prune snapshot"),
            }
        }
    }

    /// All snapshots, ordered oldest to newest.
    ///
    /// Snapshot ids are lexicographically ordered timestamps; modification
    /// time breaks ties for ids that cannot be compared.
    fn list_snapshots(&self) -> Vec<(String, PathBuf)> {
        let Ok(entries) = fs::read_dir(self.backups_root()) else {
            return Vec::new();
        };

        let mut snapshots: Vec<(String, PathBuf, std::time::SystemTime)> = entries
            .filter_map(|entry| {
                let entry = entry.ok()?;
                if !entry.path().is_dir() {
                    return None;
                }
                let modified = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                Some((
                    entry.file_name().to_string_lossy().to_string(),
                    entry.path(),
                    modified,
                ))
            })
            .collect();

        snapshots.sort_by(|a, b| a.2.cmp(&b.2).then_with(|| a.0.cmp(&b.0)));
        snapshots.into_iter().map(|(id, p, _)| (id, p)).collect()
    }
}

/// Recursive verbatim copy of a file or directory tree.
fn copy_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    if src.is_dir() {
        fs::create_dir_all(dst)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &dst.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dst).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> BackupManager {
        BackupManager::new(dir.path())
    }

    #[test]
    fn test_snapshot_copies_present_artifacts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "target/\n").unwrap();
        fs::create_dir_all(dir.path().join(".cursor/rules")).unwrap();
        fs::write(dir.path().join(".cursor/rules/rust.md"), "rules").unwrap();

        let mgr = manager(&dir);
        let id = mgr.snapshot(&PrecursorConfig::default()).unwrap();

        assert!(!id.is_empty());
        let snapshot = mgr.backups_root().join(&id);
        assert_eq!(
            fs::read_to_string(snapshot.join(".gitignore")).unwrap(),
            "target/\n"
        );
        assert_eq!(
            fs::read_to_string(snapshot.join(".cursor/rules/rust.md")).unwrap(),
            "rules"
        );
    }

    #[test]
    fn test_snapshot_disabled_is_noop() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "x\n").unwrap();

        let mut config = PrecursorConfig::default();
        config.backup.enabled = false;

        let mgr = manager(&dir);
        let id = mgr.snapshot(&config).unwrap();

        assert!(id.is_empty());
        assert!(!mgr.backups_root().exists());
    }

    #[test]
    fn test_restore_latest_round_trip() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "original\n").unwrap();

        let mgr = manager(&dir);
        mgr.snapshot(&PrecursorConfig::default()).unwrap();

        fs::write(dir.path().join(".gitignore"), "mutated\n").unwrap();
        let outcome = mgr.restore_latest().unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join(".gitignore")).unwrap(),
            "original\n"
        );
        assert!(outcome.restored.contains(&".gitignore".to_string()));
    }

    #[test]
    fn test_restore_leaves_unsnapshotted_artifacts_untouched() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "original\n").unwrap();

        let mgr = manager(&dir);
        mgr.snapshot(&PrecursorConfig::default()).unwrap();

        // Created after the snapshot; restore must not delete it.
        fs::write(dir.path().join(".mcp.json"), "{}").unwrap();
        mgr.restore_latest().unwrap();

        assert!(dir.path().join(".mcp.json").exists());
    }

    #[test]
    fn test_restore_with_no_snapshots_is_distinct_error() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);

        let result = mgr.restore_latest();

        assert!(matches!(result, Err(BackupError::NoBackupFound(_))));
    }

    #[test]
    fn test_restore_picks_newest_snapshot() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);
        let config = PrecursorConfig::default();

        fs::write(dir.path().join(".gitignore"), "v1\n").unwrap();
        let first = mgr.snapshot(&config).unwrap();
        fs::write(dir.path().join(".gitignore"), "v2\n").unwrap();
        let second = mgr.snapshot(&config).unwrap();
        assert_ne!(first, second);

        // Make ordering unambiguous regardless of fs timestamp granularity.
        let old = filetime::FileTime::from_unix_time(1_000_000, 0);
        filetime::set_file_mtime(mgr.backups_root().join(&first), old).unwrap();

        fs::write(dir.path().join(".gitignore"), "dirty\n").unwrap();
        let outcome = mgr.restore_latest().unwrap();

        assert_eq!(outcome.snapshot_id, second);
        assert_eq!(
            fs::read_to_string(dir.path().join(".gitignore")).unwrap(),
            "v2\n"
        );
    }

    #[test]
    fn test_prune_deletes_oldest_beyond_max() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "x\n").unwrap();

        let mut config = PrecursorConfig::default();
        config.backup.max_backups = 2;

        let mgr = manager(&dir);
        let mut ids = Vec::new();
        for i in 0..4 {
            let id = mgr.snapshot(&config).unwrap();
            // Distinct, strictly increasing mtimes.
            let t = filetime::FileTime::from_unix_time(1_000_000 + i * 60, 0);
            filetime::set_file_mtime(mgr.backups_root().join(&id), t).unwrap();
            ids.push(id);
        }

        mgr.prune(&config);

        let remaining: Vec<_> = fs::read_dir(mgr.backups_root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(!remaining.contains(&ids[0]));
        assert!(!remaining.contains(&ids[1]));
    }

    #[test]
    fn test_directory_restore_is_remove_then_copy() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".cursor/rules")).unwrap();
        fs::write(dir.path().join(".cursor/rules/a.md"), "a").unwrap();

        let mgr = manager(&dir);
        mgr.snapshot(&PrecursorConfig::default()).unwrap();

        // A file added after the snapshot disappears when the directory is
        // restored wholesale.
        fs::write(dir.path().join(".cursor/rules/b.md"), "b").unwrap();
        mgr.restore_latest().unwrap();

        assert!(dir.path().join(".cursor/rules/a.md").exists());
        assert!(!dir.path().join(".cursor/rules/b.md").exists());
    }
}
