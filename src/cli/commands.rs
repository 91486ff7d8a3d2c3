use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Project bootstrap and doctor tool with idempotent config scaffolding
#[derive(Parser, Debug)]
#[command(
    name = "precursor",
    about = "Project bootstrap and doctor tool with idempotent config scaffolding",
    version,
    author,
    long_about = "precursor detects which technology stacks are present in a repository, \
                  resolves the associated developer tools, and idempotently writes or merges \
                  editor settings, AI-assistant rules, CI workflows, and ignore files without \
                  clobbering existing customizations."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Increase verbosity")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,

    #[arg(long, global = true, help = "Escalate warnings to failures")]
    pub strict: bool,

    #[arg(
        long,
        global = true,
        help = "Skip anything that would require network access"
    )]
    pub offline: bool,

    #[arg(long, global = true, help = "Emit machine-readable JSON output")]
    pub json: bool,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Detect stacks and scaffold configuration artifacts",
        long_about = "Detects the technology stacks present in the workspace, snapshots \
                      managed artifacts, and writes or merges editor settings, rules, CI \
                      workflows, and ignore files. Re-running with no changes writes nothing.\n\n\
                      Examples:\n  \
                      precursor setup\n  \
                      precursor setup /path/to/repo\n  \
                      precursor setup --strict --json"
    )]
    Setup(PathArgs),

    #[command(
        about = "Report stacks, tools, and secret findings without writing",
        long_about = "Runs detection, tool resolution, and the secret scan, then reports \
                      the results. Never writes to the workspace.\n\n\
                      Examples:\n  \
                      precursor scan\n  \
                      precursor scan --json"
    )]
    Scan(PathArgs),

    #[command(
        about = "Restore managed artifacts from the most recent backup snapshot",
        long_about = "Restores every managed artifact present in the newest backup snapshot. \
                      Artifacts that were not part of the snapshot are left untouched."
    )]
    Rollback(PathArgs),

    #[command(
        about = "Delete the cached state so the next run rescans everything",
        long_about = "Removes the state file. The next setup run recomputes all hashes and \
                      rewrites artifacts whose content differs."
    )]
    Reset(PathArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct PathArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to the repository (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,
}
