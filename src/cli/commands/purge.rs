//! `ipmirror purge` command - Delete issues by filter or key
//!
//! A numeric identifier is a filter id, an identifier without `-` is a filter
//! name, anything else is a single issue key.

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{open_dashboard, print_json, print_yaml};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::dashboard::ApiResponse;
use crate::core::purge::PurgeTarget;

#[derive(clap::Args, Debug)]
pub struct PurgeArgs {
    /// Filter id, filter name, or issue key
    pub identifier: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(args: PurgeArgs, global: &GlobalOpts) -> Result<()> {
    let target = PurgeTarget::classify(&args.identifier)?;

    if !args.yes {
        let prompt = match &target {
            PurgeTarget::IssueKey(key) => format!("Delete issue {}?", key),
            PurgeTarget::FilterId(id) => format!("Delete every issue returned by filter {}?", id),
            PurgeTarget::FilterName(name) => format!("Delete every issue returned by filter '{}'?", name),
        };
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let dashboard = open_dashboard(global)?;
    let report = match dashboard.delete_by_identifier(&args.identifier) {
        Ok(report) => report,
        Err(err) => {
            if global.format == OutputFormat::Json {
                print_json(&ApiResponse::error(&err))?;
            }
            return Err(err.into());
        }
    };

    let response = if report.is_partial() {
        ApiResponse {
            status: "error",
            message: report.summary(),
        }
    } else {
        ApiResponse::success(report.summary())
    };

    match global.format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Yaml => print_yaml(&report)?,
        _ => {
            if !global.quiet {
                let mark = if report.is_partial() {
                    style("!").yellow()
                } else {
                    style("✓").green()
                };
                println!("{} {}", mark, report.summary());
            }
            for (key, message) in &report.failed {
                eprintln!("  {} {}: {}", style("✗").red(), key, message);
            }
            if global.verbose {
                for key in &report.deleted {
                    println!("  {} {}", style("-").dim(), key);
                }
            }
        }
    }

    report.into_result()?;
    Ok(())
}
