//! Configuration management for precursor
//!
//! The effective configuration is produced by deep-merging an optional on-disk
//! document over built-in defaults. The first of `precursor.json`,
//! `precursor.jsonc`, `precursor.yaml`, `precursor.yml` found at the
//! invocation directory is used; the JSON variants tolerate `//` and `/* */`
//! comments as well as trailing commas. A missing file means pure defaults.
//!
//! Every top-level section is independently optional. Unrecognized top-level
//! keys are kept in an extension bag so they round-trip through merge
//! operations instead of being dropped.
//!
//! # Example
//!
//! ```no_run
//! use precursor::config::PrecursorConfig;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = PrecursorConfig::load(Path::new("."))?;
//! config.validate()?;
//! assert_eq!(config.python.runtime, "uv");
//! # Ok(())
//! # }
//! ```

use crate::merge::{deep_merge, ArrayStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Config file names probed at the invocation directory, in priority order.
pub const CONFIG_FILE_CANDIDATES: &[&str] = &[
    "precursor.json",
    "precursor.jsonc",
    "precursor.yaml",
    "precursor.yml",
];

const DEFAULT_PYTHON_RUNTIME: &str = "uv";
const DEFAULT_WEB_PACKAGE_MANAGER: &str = "npm";
const DEFAULT_MAX_BACKUPS: usize = 10;
const DEFAULT_ENTROPY_THRESHOLD: f64 = 4.5;
const DEFAULT_SECRET_MAX_FILE_BYTES: u64 = 1_048_576;
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 3;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Workspace root resolution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceMode {
    /// Prefer the version-control root when one is discoverable.
    #[default]
    Auto,
    /// Treat the invocation directory itself as the workspace root.
    Subproject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PythonConfig {
    pub enabled: bool,
    /// Runtime/package manager used for generated Python tasks.
    pub runtime: String,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            runtime: DEFAULT_PYTHON_RUNTIME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebConfig {
    pub enabled: bool,
    pub package_manager: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            package_manager: DEFAULT_WEB_PACKAGE_MANAGER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StackToggle {
    pub enabled: bool,
}

impl Default for StackToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Explicit workspace root. Wins over every other resolution rule.
    pub root: Option<PathBuf>,
    pub mode: WorkspaceMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CiConfig {
    pub enabled: bool,
    pub provider: String,
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "github".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecretsConfig {
    pub enabled: bool,
    /// Findings abort the run before the state update. Set to false to
    /// downgrade findings to warnings.
    pub fatal: bool,
    pub entropy_threshold: f64,
    pub max_file_bytes: u64,
    /// Extra glob patterns excluded from scanning.
    pub ignore: Vec<String>,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fatal: true,
            entropy_threshold: DEFAULT_ENTROPY_THRESHOLD,
            max_file_bytes: DEFAULT_SECRET_MAX_FILE_BYTES,
            ignore: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackupConfig {
    pub enabled: bool,
    pub max_backups: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolsConfig {
    /// Explicit per-tool criticality. An entry here always overrides the
    /// built-in default-critical list.
    pub critical: std::collections::BTreeMap<String, bool>,
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            critical: Default::default(),
            timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }
}

/// Main configuration structure for precursor
///
/// Constructed via [`PrecursorConfig::load`], which merges an optional on-disk
/// document over [`Default::default`]. Immutable for the rest of the run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PrecursorConfig {
    pub python: PythonConfig,
    pub web: WebConfig,
    pub rust: StackToggle,
    pub cpp: StackToggle,
    pub docker: StackToggle,
    pub workspace: WorkspaceConfig,
    pub ci: CiConfig,
    pub secrets: SecretsConfig,
    pub backup: BackupConfig,
    pub tools: ToolsConfig,

    /// Unrecognized top-level keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl PrecursorConfig {
    /// Loads the effective configuration for an invocation directory.
    ///
    /// The first existing candidate file is parsed and deep-merged over the
    /// built-in defaults. Missing file means pure defaults.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let Some(path) = Self::find_config_file(dir) else {
            debug!(dir = %dir.display(), "no config file found, using defaults");
            return Ok(Self::default());
        };

        debug!(path = %path.display(), "loading config file");
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        let document = Self::parse_document(&path, &raw)?;
        Self::from_document(document).map_err(|message| ConfigError::Parse { path, message })
    }

    /// Deep-merges a parsed document over the defaults and deserializes.
    pub fn from_document(document: Value) -> Result<Self, String> {
        let defaults = serde_json::to_value(Self::default()).map_err(|e| e.to_string())?;
        let effective = deep_merge(&defaults, &document, ArrayStrategy::Replace);
        serde_json::from_value(effective).map_err(|e| e.to_string())
    }

    /// Returns the first existing config file candidate under `dir`.
    pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_CANDIDATES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    }

    fn parse_document(path: &Path, raw: &str) -> Result<Value, ConfigError> {
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        let parsed = if is_yaml {
            serde_yaml::from_str::<Value>(raw).map_err(|e| e.to_string())
        } else {
            let cleaned = strip_trailing_commas(&strip_jsonc_comments(raw));
            serde_json::from_str::<Value>(&cleaned).map_err(|e| e.to_string())
        };

        match parsed {
            Ok(Value::Null) => Ok(Value::Object(Default::default())),
            Ok(v @ Value::Object(_)) => Ok(v),
            Ok(_) => Err(ConfigError::Parse {
                path: path.to_path_buf(),
                message: "top-level value must be an object".to_string(),
            }),
            Err(message) => Err(ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            }),
        }
    }

    /// Validates the configuration ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backup.max_backups == 0 {
            return Err(ConfigError::ValidationFailed(
                "backup.maxBackups must be at least 1".to_string(),
            ));
        }
        if !(0.0..=8.0).contains(&self.secrets.entropy_threshold) {
            return Err(ConfigError::ValidationFailed(format!(
                "secrets.entropyThreshold must be between 0 and 8, got {}",
                self.secrets.entropy_threshold
            )));
        }
        if self.tools.timeout_secs == 0 || self.tools.timeout_secs > 60 {
            return Err(ConfigError::ValidationFailed(format!(
                "tools.timeoutSecs must be between 1 and 60, got {}",
                self.tools.timeout_secs
            )));
        }
        Ok(())
    }
}

/// Strip `//` and `/* */` comments from JSONC (JSON with comments) content.
///
/// Comment markers inside string literals are left alone. Newlines inside
/// block comments are preserved so parse errors keep useful line numbers.
pub fn strip_jsonc_comments(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            '/' => match chars.peek() {
                Some('/') => {
                    chars.next();
                    for nc in chars.by_ref() {
                        if nc == '\n' {
                            result.push('\n');
                            break;
                        }
                    }
                }
                Some('*') => {
                    chars.next();
                    let mut prev = ' ';
                    for nc in chars.by_ref() {
                        if prev == '*' && nc == '/' {
                            break;
                        }
                        if nc == '\n' {
                            result.push('\n');
                        }
                        prev = nc;
                    }
                }
                _ => result.push(c),
            },
            _ => result.push(c),
        }
    }

    result
}

/// Remove trailing commas before `}` or `]`, outside string literals.
pub fn strip_trailing_commas(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            ',' => {
                // Look ahead past whitespace; drop the comma if a closing
                // bracket follows.
                let mut lookahead = String::new();
                let mut closes = false;
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() {
                        lookahead.push(next);
                        chars.next();
                    } else {
                        closes = next == '}' || next == ']';
                        break;
                    }
                }
                if !closes {
                    result.push(',');
                }
                result.push_str(&lookahead);
            }
            _ => result.push(c),
        }
    }

    result
}
