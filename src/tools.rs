//! Developer-tool resolution
//!
//! Probes the tools associated with the detected stacks and reports their
//! state in the shape the rest of the system consumes: found/version/path/
//! source/critical. Resolution is best-effort and recomputed every run; the
//! cached copy in the state snapshot is for reporting only.
//!
//! Version probes are bounded by a short timeout and treated as "not found"
//! on expiry rather than propagating a hang.

use crate::config::PrecursorConfig;
use crate::detect::Stack;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Where a resolved tool came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolSource {
    System,
    PackageManager,
    Portable,
}

/// Resolution result for one external tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub source: ToolSource,
    pub critical: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    fn missing(critical: bool, error: impl Into<String>) -> Self {
        Self {
            found: false,
            version: None,
            path: None,
            source: ToolSource::System,
            critical,
            error: Some(error.into()),
        }
    }
}

/// Tools with no explicit config entry that default to critical.
const DEFAULT_CRITICAL: &[&str] = &["git", "cargo", "node", "uv"];

/// Whether `tool` is critical for this run.
///
/// Explicit per-tool configuration always overrides the built-in
/// default-critical list; the list only applies to tools with no entry.
pub fn is_critical(tool: &str, config: &PrecursorConfig) -> bool {
    if let Some(&explicit) = config.tools.critical.get(tool) {
        return explicit;
    }
    DEFAULT_CRITICAL.contains(&tool)
}

/// The tool ids probed for a given stack set. `git` is always probed.
pub fn tools_for(stacks: &BTreeSet<Stack>, config: &PrecursorConfig) -> Vec<String> {
    let mut tools = vec!["git".to_string()];
    for stack in stacks {
        match stack {
            Stack::Python => {
                tools.push(config.python.runtime.clone());
                tools.push("python3".to_string());
            }
            Stack::Web => {
                tools.push("node".to_string());
                tools.push(config.web.package_manager.clone());
            }
            Stack::Rust => {
                tools.push("cargo".to_string());
                tools.push("rustc".to_string());
            }
            Stack::Cpp => tools.push("cmake".to_string()),
            Stack::Docker => tools.push("docker".to_string()),
        }
    }
    tools.sort();
    tools.dedup();
    tools
}

/// Resolves every tool relevant to `stacks`, probing concurrently.
pub async fn resolve_tools(
    stacks: &BTreeSet<Stack>,
    config: &PrecursorConfig,
) -> BTreeMap<String, ToolResult> {
    let timeout = Duration::from_secs(config.tools.timeout_secs);
    let mut set = JoinSet::new();

    for tool in tools_for(stacks, config) {
        let critical = is_critical(&tool, config);
        set.spawn(async move {
            let result = probe_tool(&tool, critical, timeout).await;
            (tool, result)
        });
    }

    let mut results = BTreeMap::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((tool, result)) => {
                debug!(tool = %tool, found = result.found, "tool probe finished");
                results.insert(tool, result);
            }
            Err(e) => warn!(error = %e, "tool probe task failed"),
        }
    }
    results
}

/// Probes a single tool by spawning `<tool> --version` under a timeout.
///
/// Spawn failure or timeout both degrade to `found: false`.
async fn probe_tool(tool: &str, critical: bool, timeout: Duration) -> ToolResult {
    let path = find_in_path(tool);
    if path.is_none() {
        return ToolResult::missing(critical, format!("{tool} not found on PATH"));
    }

    let mut command = tokio::process::Command::new(tool);
    command
        .arg("--version")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return ToolResult::missing(critical, format!("failed to run {tool}: {e}"));
        }
        Err(_) => {
            warn!(tool = %tool, timeout_secs = timeout.as_secs(), "version probe timed out");
            return ToolResult::missing(critical, format!("{tool} version probe timed out"));
        }
    };

    if !output.status.success() {
        return ToolResult::missing(
            critical,
            format!("{tool} --version exited with {}", output.status),
        );
    }

    let version = String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());

    ToolResult {
        found: true,
        version,
        path: path.map(|p| p.display().to_string()),
        source: ToolSource::System,
        critical,
        error: None,
    }
}

/// Looks the executable up on PATH, honoring PATHEXT-less unix semantics.
fn find_in_path(tool: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(tool);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let exe = dir.join(format!("{tool}.exe"));
            if exe.is_file() {
                return Some(exe);
            }
        }
    }
    None
}
