//! Managed artifact definitions and desired-content composition
//!
//! The fixed set of files and directories the tool is allowed to create,
//! merge, and back up, plus the default content fragments composed for each
//! detected stack. Content here is intentionally plain — the interesting
//! contract is how fragments are merged into pre-existing files, which lives
//! in the writer and merge engine.

use crate::config::PrecursorConfig;
use crate::detect::Stack;
use serde_json::{json, Value};

/// Every path the system may create, merge, or back up, relative to the
/// workspace root. Rollback and run-level snapshots operate on exactly this
/// set.
pub const MANAGED_PATHS: &[&str] = &[
    ".vscode/settings.json",
    ".vscode/extensions.json",
    ".mcp.json",
    ".cursor/rules",
    ".github/workflows",
    ".gitignore",
    ".cursorignore",
];

pub const EDITOR_SETTINGS_PATH: &str = ".vscode/settings.json";
pub const EDITOR_EXTENSIONS_PATH: &str = ".vscode/extensions.json";
pub const MCP_CONFIG_PATH: &str = ".mcp.json";
pub const RULES_DIR: &str = ".cursor/rules";
pub const WORKFLOWS_DIR: &str = ".github/workflows";
pub const GITIGNORE_PATH: &str = ".gitignore";
pub const AI_IGNORE_PATH: &str = ".cursorignore";

/// Editor settings fragment for one stack.
pub fn editor_settings(stack: Stack, config: &PrecursorConfig) -> Value {
    match stack {
        Stack::Python => {
            let interpreter = if config.python.runtime == "uv" {
                ".venv/bin/python"
            } else {
                "python3"
            };
            json!({
                "python.terminal.activateEnvironment": true,
                "[python]": {
                    "editor.defaultFormatter": "charliermarsh.ruff"
                },
                "python.defaultInterpreterPath": interpreter,
            })
        }
        Stack::Web => json!({
            "[typescript]": {
                "editor.defaultFormatter": "esbenp.prettier-vscode"
            },
            "[javascript]": {
                "editor.defaultFormatter": "esbenp.prettier-vscode"
            },
        }),
        Stack::Rust => json!({
            "rust-analyzer.check.command": "clippy",
        }),
        Stack::Cpp => json!({
            "C_Cpp.default.configurationProvider": "ms-vscode.cmake-tools",
        }),
        Stack::Docker => json!({}),
    }
}

/// Base editor settings applied whenever any stack is present.
pub fn editor_settings_base() -> Value {
    json!({
        "files.insertFinalNewline": true,
        "files.trimTrailingWhitespace": true,
    })
}

/// Extension recommendations for one stack.
pub fn editor_extensions(stack: Stack) -> Value {
    let recommendations: Vec<&str> = match stack {
        Stack::Python => vec!["ms-python.python", "charliermarsh.ruff"],
        Stack::Web => vec!["dbaeumer.vscode-eslint", "esbenp.prettier-vscode"],
        Stack::Rust => vec!["rust-lang.rust-analyzer"],
        Stack::Cpp => vec!["ms-vscode.cpptools", "ms-vscode.cmake-tools"],
        Stack::Docker => vec!["ms-azuretools.vscode-docker"],
    };
    json!({ "recommendations": recommendations })
}

/// Skeleton MCP server configuration. Existing server entries always survive
/// the merge untouched.
pub fn mcp_config() -> Value {
    json!({ "mcpServers": {} })
}

/// Default rule document for one stack. Merged with the line-append policy so
/// hand-written additions survive.
pub fn rule_document(stack: Stack) -> (String, String) {
    let file = format!("{}.md", stack.name());
    let body = match stack {
        Stack::Python => "\
# Python\n\
\n\
- Manage dependencies through the configured runtime, not ad-hoc pip installs.\n\
- Type-annotate public functions.\n\
- Keep module side effects out of import time.\n",
        Stack::Web => "\
# Web\n\
\n\
- Keep components small; colocate styles with their component.\n\
- Prefer the project's package manager scripts over global tools.\n",
        Stack::Rust => "\
# Rust\n\
\n\
- Propagate errors with `?`; avoid unwrap outside tests.\n\
- Run clippy before committing.\n\
- Prefer borrowing over cloning in hot paths.\n",
        Stack::Cpp => "\
# C++\n\
\n\
- Build out-of-source through CMake presets.\n\
- Prefer RAII over manual resource management.\n",
        Stack::Docker => "\
# Docker\n\
\n\
- Pin base image versions.\n\
- Keep images minimal; use multi-stage builds.\n",
    };
    (file, body.to_string())
}

/// CI workflow document for one stack, as a structured tree merged into any
/// existing workflow of the same name.
pub fn ci_workflow(stack: Stack) -> (String, Value) {
    let file = format!("{}-ci.yml", stack.name());
    let (name, steps) = match stack {
        Stack::Python => (
            "Python CI",
            json!([
                { "uses": "actions/checkout@v4" },
                { "uses": "astral-sh/setup-uv@v5" },
                { "run": "uv sync" },
                { "run": "uv run pytest" },
            ]),
        ),
        Stack::Web => (
            "Web CI",
            json!([
                { "uses": "actions/checkout@v4" },
                { "uses": "actions/setup-node@v4", "with": { "node-version": "20" } },
                { "run": "npm ci" },
                { "run": "npm test" },
            ]),
        ),
        Stack::Rust => (
            "Rust CI",
            json!([
                { "uses": "actions/checkout@v4" },
                { "run": "cargo build --locked" },
                { "run": "cargo test --locked" },
                { "run": "cargo clippy -- -D warnings" },
            ]),
        ),
        Stack::Cpp => (
            "C++ CI",
            json!([
                { "uses": "actions/checkout@v4" },
                { "run": "cmake -B build" },
                { "run": "cmake --build build" },
                { "run": "ctest --test-dir build" },
            ]),
        ),
        Stack::Docker => (
            "Docker CI",
            json!([
                { "uses": "actions/checkout@v4" },
                { "run": "docker build ." },
            ]),
        ),
    };

    let workflow = json!({
        "name": name,
        "on": {
            "push": { "branches": ["main"] },
            "pull_request": {},
        },
        "jobs": {
            "build": {
                "runs-on": "ubuntu-latest",
                "steps": steps,
            }
        }
    });
    (file, workflow)
}

/// Git ignore patterns: defaults plus per-stack entries.
pub fn gitignore_patterns(stacks: impl IntoIterator<Item = Stack>) -> String {
    let mut lines = vec![".precursor/".to_string(), ".DS_Store".to_string()];
    for stack in stacks {
        let extra: &[&str] = match stack {
            Stack::Python => &["__pycache__/", ".venv/", "*.pyc"],
            Stack::Web => &["node_modules/", "dist/"],
            Stack::Rust => &["target/"],
            Stack::Cpp => &["build/"],
            Stack::Docker => &[],
        };
        lines.extend(extra.iter().map(|s| s.to_string()));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// AI-assistant ignore patterns, stack-independent.
pub fn ai_ignore_patterns() -> String {
    [
        ".precursor/",
        ".env",
        ".env.*",
        "*.pem",
        "*.key",
        "node_modules/",
        "target/",
    ]
    .join("\n")
        + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_paths_cover_all_artifact_constants() {
        for path in [
            EDITOR_SETTINGS_PATH,
            EDITOR_EXTENSIONS_PATH,
            MCP_CONFIG_PATH,
            RULES_DIR,
            WORKFLOWS_DIR,
            GITIGNORE_PATH,
            AI_IGNORE_PATH,
        ] {
            assert!(MANAGED_PATHS.contains(&path), "{path} not managed");
        }
    }

    #[test]
    fn test_every_stack_has_rule_and_workflow() {
        for stack in Stack::all() {
            let (rule_file, rule_body) = rule_document(*stack);
            assert!(rule_file.ends_with(".md"));
            assert!(!rule_body.is_empty());

            let (wf_file, wf) = ci_workflow(*stack);
            assert!(wf_file.ends_with("-ci.yml"));
            assert!(wf["jobs"]["build"]["steps"].is_array());
        }
    }

    #[test]
    fn test_gitignore_includes_defaults_without_stacks() {
        let patterns = gitignore_patterns([]);
        assert!(patterns.contains(".precursor/"));
        assert!(!patterns.contains("target/"));
    }

    #[test]
    fn test_gitignore_includes_stack_patterns() {
        let patterns = gitignore_patterns([Stack::Rust, Stack::Python]);
        assert!(patterns.contains("target/"));
        assert!(patterns.contains("__pycache__/"));
    }

    #[test]
    fn test_extensions_are_recommendation_lists() {
        for stack in Stack::all() {
            let value = editor_extensions(*stack);
            assert!(value["recommendations"].is_array());
        }
    }
}
