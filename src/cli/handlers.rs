//! Subcommand handlers
//!
//! Each handler loads the effective configuration, resolves the workspace
//! root, dispatches into the core, prints the formatted report, and returns
//! the process exit code: 0 on success, 1 on any fatal error (including
//! `--strict` escalating warnings).

use crate::backup::{BackupError, BackupManager};
use crate::cli::commands::{CliArgs, PathArgs};
use crate::cli::output::{OutputFormat, OutputFormatter};
use crate::config::PrecursorConfig;
use crate::scaffold::{Orchestrator, RunIssue, RunReport};
use crate::state::StateStore;
use crate::workspace;
use serde_json::json;
use std::path::PathBuf;
use tracing::error;

fn invocation_dir(args: &PathArgs) -> PathBuf {
    args.path
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn formatter(global: &CliArgs) -> OutputFormatter {
    let format = if global.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    OutputFormatter::new(format, global.no_color)
}

fn emit(report: &RunReport, global: &CliArgs) -> i32 {
    match formatter(global).format(report) {
        Ok(text) => print!("{text}"),
        Err(e) => {
            error!(error = %e, "failed to format report");
            return 1;
        }
    }
    if report.success {
        0
    } else {
        1
    }
}

fn failure(subject: &str, message: String, global: &CliArgs) -> i32 {
    let report = RunReport {
        success: false,
        message: message.clone(),
        data: None,
        errors: vec![RunIssue::new(subject, message)],
        warnings: vec![],
    };
    emit(&report, global)
}

/// Loads config and resolves the root, or reports the failure.
fn prepare(args: &PathArgs) -> Result<(PathBuf, PrecursorConfig), String> {
    let dir = invocation_dir(args);
    let config = PrecursorConfig::load(&dir).map_err(|e| e.to_string())?;
    config.validate().map_err(|e| e.to_string())?;
    let root = workspace::resolve_root(&dir, &config).map_err(|e| e.to_string())?;
    Ok((root, config))
}

pub async fn handle_setup(args: &PathArgs, global: &CliArgs) -> i32 {
    let (root, config) = match prepare(args) {
        Ok(prepared) => prepared,
        Err(message) => return failure("config", message, global),
    };

    let report = Orchestrator::new(&root, config)
        .strict(global.strict)
        .offline(global.offline)
        .run()
        .await;
    emit(&report, global)
}

pub async fn handle_scan(args: &PathArgs, global: &CliArgs) -> i32 {
    let (root, config) = match prepare(args) {
        Ok(prepared) => prepared,
        Err(message) => return failure("config", message, global),
    };

    let report = Orchestrator::new(&root, config)
        .strict(global.strict)
        .offline(global.offline)
        .scan()
        .await;
    emit(&report, global)
}

pub async fn handle_rollback(args: &PathArgs, global: &CliArgs) -> i32 {
    let (root, _config) = match prepare(args) {
        Ok(prepared) => prepared,
        Err(message) => return failure("config", message, global),
    };

    let report = match BackupManager::new(&root).restore_latest() {
        Ok(outcome) => RunReport {
            success: true,
            message: format!("restored snapshot {}", outcome.snapshot_id),
            data: Some(json!({
                "snapshotId": outcome.snapshot_id,
                "restored": outcome.restored,
            })),
            errors: vec![],
            warnings: vec![],
        },
        // Nothing to roll back is a distinct condition, not a generic
        // failure: callers can tell it apart from a broken rollback.
        Err(e @ BackupError::NoBackupFound(_)) => RunReport {
            success: false,
            message: "NoBackupFound".to_string(),
            data: None,
            errors: vec![RunIssue::new("backup", e.to_string())],
            warnings: vec![],
        },
        Err(e) => RunReport {
            success: false,
            message: "rollback failed".to_string(),
            data: None,
            errors: vec![RunIssue::new("backup", e.to_string())],
            warnings: vec![],
        },
    };
    emit(&report, global)
}

pub async fn handle_reset(args: &PathArgs, global: &CliArgs) -> i32 {
    let (root, _config) = match prepare(args) {
        Ok(prepared) => prepared,
        Err(message) => return failure("config", message, global),
    };

    let report = match StateStore::new(&root).reset() {
        Ok(()) => RunReport {
            success: true,
            message: "state cleared; next run will rescan everything".to_string(),
            data: None,
            errors: vec![],
            warnings: vec![],
        },
        Err(e) => RunReport {
            success: false,
            message: "reset failed".to_string(),
            data: None,
            errors: vec![RunIssue::new("state", e.to_string())],
            warnings: vec![],
        },
    };
    emit(&report, global)
}
