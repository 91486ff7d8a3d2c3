//! precursor - project bootstrap and doctor tool
//!
//! This library detects which technology stacks are present in a repository,
//! resolves the associated developer tools, and idempotently writes or merges
//! a set of configuration artifacts (editor settings, AI-assistant rules, CI
//! workflows, ignore files) without clobbering pre-existing customizations.
//!
//! # Core Concepts
//!
//! - **Stacks**: detected technology ecosystems (Python, Web, Rust, C++,
//!   Docker) driving which artifacts get scaffolded
//! - **Managed Artifacts**: the fixed set of files and directories the tool
//!   may create, merge, and back up
//! - **Deep Merge**: recursive combination of generated defaults with
//!   existing structured documents, preserving unknown keys
//! - **Idempotence**: a hash-based state cache plus content-equality write
//!   gates guarantee a second run with no external changes writes nothing
//!
//! # Example Usage
//!
//! ```ignore
//! use precursor::config::PrecursorConfig;
//! use precursor::scaffold::Orchestrator;
//! use precursor::workspace;
//! use std::path::Path;
//!
//! async fn bootstrap(dir: &Path) -> anyhow::Result<()> {
//!     let config = PrecursorConfig::load(dir)?;
//!     let root = workspace::resolve_root(dir, &config)?;
//!     let report = Orchestrator::new(&root, config).run().await;
//!     println!("{}", report.message);
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`detect`]: marker-file stack detection
//! - [`merge`]: the deep-merge engine backing all structured scaffolding
//! - [`state`]: hash-based state store enabling cheap re-runs
//! - [`backup`]: per-run snapshots and rollback
//! - [`writer`]: atomic, content-equality-gated file writes
//! - [`scaffold`]: the orchestrated bootstrap sequence
//! - [`secrets`]: best-effort secret scanning

// Public modules
pub mod backup;
pub mod cli;
pub mod config;
pub mod detect;
pub mod merge;
pub mod scaffold;
pub mod secrets;
pub mod state;
pub mod tools;
pub mod util;
pub mod workspace;
pub mod writer;

// Re-export key types for convenient access
pub use backup::{BackupError, BackupManager, RestoreOutcome};
pub use config::{ConfigError, PrecursorConfig};
pub use detect::Stack;
pub use merge::{deep_merge, merge_text_lines, ArrayStrategy};
pub use scaffold::{Orchestrator, RunIssue, RunReport};
pub use secrets::{SecretFinding, SecretScanner};
pub use state::{StateSnapshot, StateStore};
pub use tools::{ToolResult, ToolSource};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};
pub use writer::WriteOutcome;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_precursor() {
        assert_eq!(NAME, "precursor");
    }
}
