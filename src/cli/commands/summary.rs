//! `ipmirror summary` command - Per-interface counts for a platform

use console::style;
use miette::Result;

use crate::cli::helpers::{open_dashboard, print_csv, print_json, print_yaml, render_table};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct SummaryArgs {
    /// Platform label, e.g. SVB (exact match)
    pub platform: String,
}

pub fn run(args: SummaryArgs, global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    let summary = dashboard.get_platform_summary(&args.platform)?;

    match global.format {
        OutputFormat::Json => return print_json(&summary),
        OutputFormat::Yaml => return print_yaml(&summary),
        OutputFormat::Csv => return print_csv(&summary),
        _ => {}
    }

    if summary.is_empty() {
        if !global.quiet {
            println!(
                "No interfaces with targets on platform {}",
                style(&args.platform).cyan()
            );
        }
        return Ok(());
    }

    let rows: Vec<Vec<String>> = summary
        .iter()
        .map(|s| {
            vec![
                s.interface.clone(),
                s.target_count.to_string(),
                s.pass_count.to_string(),
                s.fail_count.to_string(),
                s.unresolved_count.to_string(),
            ]
        })
        .collect();
    print!(
        "{}",
        render_table(
            &["Interface", "Target", "Pass", "Fail", "Unresolved"],
            &rows,
            global.format
        )
    );

    if !global.quiet && global.format == OutputFormat::Auto {
        println!(
            "{} interface(s) on {}",
            style(summary.len()).cyan(),
            style(&args.platform).cyan()
        );
    }
    Ok(())
}
