//! Stack detection
//!
//! Classifies which technology stacks are present under a workspace root by
//! checking marker files directly under the root and, for stacks without a
//! definitive manifest, walking a bounded depth for extension-matched source
//! files. Detection has no side effects and is deterministic: the result is a
//! set, independent of filesystem iteration order.

pub mod markers;

use crate::config::PrecursorConfig;
use ignore::WalkBuilder;
use markers::{StackMarkers, MARKER_TABLE, NOISE_DIRS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Maximum directory depth for the extension-based fallback walk.
const MAX_WALK_DEPTH: usize = 2;

/// A detected technology stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stack {
    Python,
    Web,
    Rust,
    Cpp,
    Docker,
}

impl Stack {
    pub fn name(&self) -> &'static str {
        match self {
            Stack::Python => "python",
            Stack::Web => "web",
            Stack::Rust => "rust",
            Stack::Cpp => "cpp",
            Stack::Docker => "docker",
        }
    }

    /// All stacks, in canonical order.
    pub fn all() -> &'static [Stack] {
        &[Stack::Python, Stack::Web, Stack::Rust, Stack::Cpp, Stack::Docker]
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Detects the set of stacks present under `root`.
///
/// Filesystem access errors are swallowed per-directory and treated as "not
/// found" for that subtree; detection never aborts the run.
pub fn detect(root: &Path, config: &PrecursorConfig) -> BTreeSet<Stack> {
    let mut stacks = BTreeSet::new();

    for markers in MARKER_TABLE {
        if !stack_enabled(markers.stack, config) {
            continue;
        }

        if has_root_marker(root, markers) {
            debug!(stack = %markers.stack, "detected via marker file");
            stacks.insert(markers.stack);
            continue;
        }

        if !markers.source_extensions.is_empty() && has_source_files(root, markers) {
            debug!(stack = %markers.stack, "detected via source extension walk");
            stacks.insert(markers.stack);
        }
    }

    stacks
}

fn stack_enabled(stack: Stack, config: &PrecursorConfig) -> bool {
    match stack {
        Stack::Python => config.python.enabled,
        Stack::Web => config.web.enabled,
        Stack::Rust => config.rust.enabled,
        Stack::Cpp => config.cpp.enabled,
        Stack::Docker => config.docker.enabled,
    }
}

fn has_root_marker(root: &Path, markers: &StackMarkers) -> bool {
    markers
        .manifest_files
        .iter()
        .any(|name| root.join(name).exists())
}

/// Bounded-depth walk for extension-matched source files, skipping noise
/// directories (dependency caches, build outputs, VCS internals).
fn has_source_files(root: &Path, markers: &StackMarkers) -> bool {
    let walker = WalkBuilder::new(root)
        .max_depth(Some(MAX_WALK_DEPTH))
        .hidden(true)
        .git_ignore(true)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !NOISE_DIRS.contains(&name.as_ref())
        })
        .build();

    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "failed to read directory entry during detection");
                continue;
            }
        };

        if !entry.path().is_file() {
            continue;
        }

        if let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) {
            if markers.source_extensions.contains(&ext) {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn detect_default(root: &Path) -> BTreeSet<Stack> {
        detect(root, &PrecursorConfig::default())
    }

    #[test]
    fn test_empty_repo_detects_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(detect_default(dir.path()).is_empty());
    }

    #[test]
    fn test_python_and_web_markers() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[project]\nname = \"x\"\n").unwrap();
        fs::write(dir.path().join("package.json"), "{\"name\": \"x\"}").unwrap();

        let stacks = detect_default(dir.path());

        assert_eq!(
            stacks,
            BTreeSet::from([Stack::Python, Stack::Web])
        );
    }

    #[test]
    fn test_rust_marker() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"x\"\n").unwrap();

        assert_eq!(detect_default(dir.path()), BTreeSet::from([Stack::Rust]));
    }

    #[test]
    fn test_docker_marker() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Dockerfile"), "FROM debian\n").unwrap();

        assert_eq!(detect_default(dir.path()), BTreeSet::from([Stack::Docker]));
    }

    #[test]
    fn test_web_via_extension_walk() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("site")).unwrap();
        fs::write(dir.path().join("site/app.ts"), "console.log(1);").unwrap();

        assert_eq!(detect_default(dir.path()), BTreeSet::from([Stack::Web]));
    }

    #[test]
    fn test_cpp_via_extension_walk() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.cpp"), "int main() { return 0; }").unwrap();

        assert_eq!(detect_default(dir.path()), BTreeSet::from([Stack::Cpp]));
    }

    #[test]
    fn test_walk_skips_noise_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/index.js"), "x").unwrap();

        assert!(detect_default(dir.path()).is_empty());
    }

    #[test]
    fn test_walk_depth_is_bounded() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("a/b/c");
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("page.tsx"), "x").unwrap();

        // Depth 3 is beyond the bounded walk.
        assert!(detect_default(dir.path()).is_empty());
    }

    #[test]
    fn test_disabled_stack_is_not_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\n").unwrap();

        let mut config = PrecursorConfig::default();
        config.rust.enabled = false;

        assert!(detect(dir.path(), &config).is_empty());
    }

    #[test]
    fn test_detection_is_deterministic() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[project]\n").unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\n").unwrap();

        let first = detect_default(dir.path());
        for _ in 0..5 {
            assert_eq!(detect_default(dir.path()), first);
        }
    }
}
