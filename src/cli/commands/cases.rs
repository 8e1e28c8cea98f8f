//! `ipmirror cases` command - Case lists behind the summary counts

use console::style;
use miette::Result;

use crate::cli::helpers::{open_dashboard, print_csv, print_json, print_yaml, render_table, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct CasesArgs {
    /// Interface id
    pub interface: String,

    /// `target`, `unresolved`, or a word matched against the filter name (e.g. `pass`).
    /// Without it, every row of the interface is listed.
    pub status: Option<String>,

    /// Restrict to one platform
    #[arg(long, short = 'p')]
    pub platform: Option<String>,

    /// List the interface's rows the tracker reports as unresolved
    #[arg(long, conflicts_with = "status")]
    pub open: bool,
}

pub fn run(args: CasesArgs, global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    let platform = args.platform.as_deref();

    let cases = match (&args.status, args.open) {
        (_, true) => dashboard.get_merged_unresolved_cases(&args.interface, platform)?,
        (Some(status), false) => dashboard.get_cases(&args.interface, status, platform)?,
        (None, false) => dashboard.get_interface_cases(&args.interface, platform)?,
    };

    match global.format {
        OutputFormat::Json => return print_json(&cases),
        OutputFormat::Yaml => return print_yaml(&cases),
        OutputFormat::Csv => return print_csv(&cases),
        _ => {}
    }

    if cases.is_empty() {
        if !global.quiet {
            println!("No cases for {}", style(&args.interface).cyan());
        }
        return Ok(());
    }

    let width = if global.format == OutputFormat::Auto { 80 } else { usize::MAX };
    let rows: Vec<Vec<String>> = cases
        .iter()
        .map(|c| {
            vec![
                c.sequence_number.to_string(),
                truncate_str(&c.summary_text, width),
                c.status_text.clone(),
            ]
        })
        .collect();
    print!("{}", render_table(&["No", "Details", "Status"], &rows, global.format));

    if !global.quiet && global.format == OutputFormat::Auto {
        println!("{} case(s)", style(cases.len()).cyan());
    }
    Ok(())
}
