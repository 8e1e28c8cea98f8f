//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    cases::CasesArgs, completions::CompletionsArgs, filter::FilterCommands, init::InitArgs,
    project::ProjectCommands, purge::PurgeArgs, refresh::RefreshArgs, role::RoleCommands,
    snapshot::SnapshotCommands, summary::SummaryArgs,
};

#[derive(Parser)]
#[command(name = "ipmirror")]
#[command(author, version, about = "Mirror IP verification status from Jira")]
#[command(long_about = "Keeps per-platform IP verification status in a local snapshot of Jira issues, \
    and manages the saved filters and role permissions that feed it.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .ipmirror/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new ipmirror workspace
    Init(InitArgs),

    /// Per-interface counts for a platform
    Summary(SummaryArgs),

    /// List the cases behind an interface's counts
    Cases(CasesArgs),

    /// Rebuild the snapshot from the category filters
    Refresh(RefreshArgs),

    /// Saved filter management
    #[command(subcommand)]
    Filter(FilterCommands),

    /// Delete an issue, or every issue a filter returns
    Purge(PurgeArgs),

    /// Role permissions on filters
    #[command(subcommand)]
    Role(RoleCommands),

    /// Tracker project lookups
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Inspect or export the local snapshot
    #[command(subcommand)]
    Snapshot(SnapshotCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables and messages
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}
