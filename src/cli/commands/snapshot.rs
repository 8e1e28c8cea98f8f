//! `ipmirror snapshot` command - Inspect the local snapshot
//!
//! The snapshot is a SQLite database with one table per category. It is
//! user-local (gitignored) and rebuilt by `ipmirror refresh`.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{open_dashboard, print_json, print_yaml, write_output};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::snapshot::store::COLUMNS;
use crate::core::snapshot::{Category, Snapshot};

#[derive(Subcommand, Debug)]
pub enum SnapshotCommands {
    /// Show snapshot location, build time, and row counts
    Status,

    /// Export snapshot rows as CSV
    Export {
        /// Only export this category
        #[arg(long, short = 'c', value_enum)]
        category: Option<Category>,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

pub fn run(cmd: SnapshotCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SnapshotCommands::Status => run_status(global),
        SnapshotCommands::Export { category, output } => run_export(category, output, global),
    }
}

fn run_status(global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    let status = dashboard.snapshot_status()?;

    match global.format {
        OutputFormat::Json => return print_json(&status),
        OutputFormat::Yaml => return print_yaml(&status),
        _ => {}
    }

    println!("{}", style("Snapshot Status").bold());
    println!("{}", style("─".repeat(40)).dim());
    println!("  Location:    {}", status.path.display());

    if !status.available {
        println!("  State:       {}", style("not built").yellow());
        println!();
        println!("Run {} to build it", style("ipmirror refresh").yellow());
        return Ok(());
    }

    let built = status
        .built_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("  Built:       {}", style(built).cyan());
    if let Some(fingerprint) = &status.fingerprint {
        println!("  Fingerprint: {}", style(&fingerprint[..12.min(fingerprint.len())]).dim());
    }
    println!();
    println!("  {}", style("Rows:").bold());
    for (category, count) in &status.rows {
        println!("    {:<11} {}", category, count);
    }
    Ok(())
}

fn run_export(category: Option<Category>, output: Option<PathBuf>, global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    let snapshot = dashboard.snapshot()?;
    let categories: Vec<Category> = match category {
        Some(c) => vec![c],
        None => Category::ALL.to_vec(),
    };
    let content = export_csv(&snapshot, &categories)?;
    write_output(&content, output)
}

/// One header row, then one line per row in sheet order
fn export_csv(snapshot: &Snapshot, categories: &[Category]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["Category"];
    header.extend(COLUMNS.iter().map(|(_, label)| *label));
    writer.write_record(&header).into_diagnostic()?;

    for &category in categories {
        for row in snapshot.sheet(category) {
            writer
                .write_record([
                    category.as_str(),
                    row.issue_key.as_str(),
                    row.filter.as_str(),
                    row.summary.as_str(),
                    row.platform.as_str(),
                    row.interface_id.as_str(),
                    row.status.as_str(),
                    row.due_date.as_str(),
                    row.resolution.as_str(),
                ])
                .into_diagnostic()?;
        }
    }

    let bytes = writer.into_inner().map_err(|e| miette::miette!("{}", e))?;
    String::from_utf8(bytes).into_diagnostic()
}
