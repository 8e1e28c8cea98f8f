//! `ipmirror refresh` command - Rebuild the snapshot from the tracker

use console::style;
use miette::Result;

use crate::cli::helpers::{open_dashboard, report_outcome};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct RefreshArgs {}

pub fn run(_args: RefreshArgs, global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;

    if !global.quiet && global.format == OutputFormat::Auto {
        println!("{} Refreshing snapshot...", style("→").blue());
    }

    let stats = report_outcome(global, dashboard.refresh_snapshot(), |stats| {
        format!(
            "Snapshot refreshed: {} rows in {}ms",
            stats.total_rows(),
            stats.duration_ms
        )
    })?;

    if !global.quiet && global.format == OutputFormat::Auto {
        for (category, count) in &stats.rows {
            println!("  {:<11} {}", category, style(count).cyan());
        }
        println!("  Location:   {}", dashboard.store().path().display());
    }
    Ok(())
}
