//! Output formatting for run reports
//!
//! Renders a [`RunReport`] either as human-readable text or as JSON for
//! machine consumption. Color is applied only when writing to a terminal and
//! not suppressed with `--no-color`.

use crate::scaffold::RunReport;
use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

pub struct OutputFormatter {
    format: OutputFormat,
    use_color: bool,
}

const GREEN: &str = "\u{1b}[32m";
const RED: &str = "\u{1b}[31m";
const YELLOW: &str = "\u{1b}[33m";
const RESET: &str = "\u{1b}[0m";

impl OutputFormatter {
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        let use_color =
            format == OutputFormat::Human && !no_color && atty::is(atty::Stream::Stdout);
        Self { format, use_color }
    }

    pub fn format(&self, report: &RunReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(report).context("Failed to serialize run report")
            }
            OutputFormat::Human => Ok(self.format_human(report)),
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn format_human(&self, report: &RunReport) -> String {
        let mut out = String::new();

        if report.success {
            out.push_str(&self.paint(GREEN, "\u{2713}"));
        } else {
            out.push_str(&self.paint(RED, "\u{2717}"));
        }
        out.push(' ');
        out.push_str(&report.message);
        out.push('\n');

        if let Some(data) = &report.data {
            if let Some(stacks) = data.get("stacks").and_then(|s| s.as_array()) {
                let names: Vec<&str> = stacks.iter().filter_map(|s| s.as_str()).collect();
                if names.is_empty() {
                    out.push_str("Stacks:   (none)\n");
                } else {
                    out.push_str(&format!("Stacks:   {}\n", names.join(", ")));
                }
            }
            if let Some(writes) = data.get("writes").and_then(|w| w.as_u64()) {
                out.push_str(&format!("Writes:   {writes}\n"));
            }
            if let Some(tools) = data.get("tools").and_then(|t| t.as_object()) {
                out.push_str("Tools:\n");
                for (name, tool) in tools {
                    let found = tool.get("found").and_then(|f| f.as_bool()).unwrap_or(false);
                    let marker = if found {
                        self.paint(GREEN, "\u{2713}")
                    } else {
                        self.paint(YELLOW, "\u{2717}")
                    };
                    let version = tool
                        .get("version")
                        .and_then(|v| v.as_str())
                        .unwrap_or("not found");
                    out.push_str(&format!("  {marker} {name}: {version}\n"));
                }
            }
        }

        if !report.errors.is_empty() {
            out.push_str(&self.paint(RED, "Errors:"));
            out.push('\n');
            for issue in &report.errors {
                out.push_str(&format!("  - {}: {}\n", issue.subject, issue.message));
            }
        }
        if !report.warnings.is_empty() {
            out.push_str(&self.paint(YELLOW, "Warnings:"));
            out.push('\n');
            for issue in &report.warnings {
                out.push_str(&format!("  - {}: {}\n", issue.subject, issue.message));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaffold::RunIssue;
    use serde_json::json;

    fn sample_report() -> RunReport {
        RunReport {
            success: true,
            message: "run completed".to_string(),
            data: Some(json!({
                "stacks": ["rust"],
                "writes": 3,
                "tools": {
                    "cargo": {"found": true, "version": "cargo 1.75.0"},
                    "cmake": {"found": false},
                }
            })),
            errors: vec![],
            warnings: vec![RunIssue::new("cmake", "cmake not found on PATH")],
        }
    }

    #[test]
    fn test_json_output_round_trips() {
        let formatter = OutputFormatter::new(OutputFormat::Json, true);
        let output = formatter.format(&sample_report()).unwrap();

        let parsed: RunReport = serde_json::from_str(&output).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn test_human_output_mentions_stacks_and_writes() {
        let formatter = OutputFormatter::new(OutputFormat::Human, true);
        let output = formatter.format(&sample_report()).unwrap();

        assert!(output.contains("run completed"));
        assert!(output.contains("Stacks:   rust"));
        assert!(output.contains("Writes:   3"));
        assert!(output.contains("cargo 1.75.0"));
        assert!(output.contains("Warnings:"));
    }

    #[test]
    fn test_no_color_output_has_no_escapes() {
        let formatter = OutputFormatter::new(OutputFormat::Human, true);
        let output = formatter.format(&sample_report()).unwrap();
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn test_failed_report_lists_errors() {
        let report = RunReport {
            success: false,
            message: "run aborted during scanning-secrets".to_string(),
            data: None,
            errors: vec![RunIssue::new("src/config.py", "possible secret at line 4")],
            warnings: vec![],
        };

        let formatter = OutputFormatter::new(OutputFormat::Human, true);
        let output = formatter.format(&report).unwrap();

        assert!(output.contains("\u{2717}"));
        assert!(output.contains("Errors:"));
        assert!(output.contains("src/config.py"));
    }
}
