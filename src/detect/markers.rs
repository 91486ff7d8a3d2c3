//! Per-stack marker definitions
//!
//! Each stack is recognized by manifest/lockfile markers directly under the
//! workspace root. Stacks whose presence cannot be pinned to a single
//! manifest (web, cpp) also list source extensions for the bounded fallback
//! walk.

use super::Stack;

pub struct StackMarkers {
    pub stack: Stack,
    /// Marker paths checked directly under the workspace root.
    pub manifest_files: &'static [&'static str],
    /// Extensions for the bounded-depth fallback walk. Empty means the stack
    /// is manifest-only.
    pub source_extensions: &'static [&'static str],
}

/// Directories skipped by the fallback walk: dependency caches, build
/// outputs, virtualenvs, VCS internals.
pub const NOISE_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "build",
    "dist",
    "out",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".cache",
    "vendor",
    ".precursor",
];

pub const MARKER_TABLE: &[StackMarkers] = &[
    StackMarkers {
        stack: Stack::Python,
        manifest_files: &[
            "pyproject.toml",
            "setup.py",
            "setup.cfg",
            "requirements.txt",
            "Pipfile",
            "uv.lock",
        ],
        source_extensions: &[],
    },
    StackMarkers {
        stack: Stack::Web,
        manifest_files: &[
            "package.json",
            "pnpm-lock.yaml",
            "yarn.lock",
            "tsconfig.json",
        ],
        source_extensions: &["js", "jsx", "ts", "tsx", "html"],
    },
    StackMarkers {
        stack: Stack::Rust,
        manifest_files: &["Cargo.toml", "Cargo.lock", "rust-toolchain.toml"],
        source_extensions: &[],
    },
    StackMarkers {
        stack: Stack::Cpp,
        manifest_files: &[
            "CMakeLists.txt",
            "meson.build",
            "conanfile.txt",
            "vcpkg.json",
        ],
        source_extensions: &["cpp", "cc", "cxx", "hpp", "hh"],
    },
    StackMarkers {
        stack: Stack::Docker,
        manifest_files: &[
            "Dockerfile",
            "docker-compose.yml",
            "docker-compose.yaml",
            "compose.yaml",
        ],
        source_extensions: &[],
    },
];
