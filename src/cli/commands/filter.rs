//! `ipmirror filter` command - Saved filter management

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{open_dashboard, print_json, print_yaml, render_table, report_outcome};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::snapshot::category_filter_name;

#[derive(Subcommand, Debug)]
pub enum FilterCommands {
    /// Create a filter, or update the query of the filter with this name
    Set {
        /// Filter name (case-sensitive)
        name: String,

        /// JQL query text
        jql: String,
    },

    /// Show a filter by id or name
    Show {
        /// Numeric filter id or filter name
        identifier: String,
    },

    /// Create the category filters for a project if they are missing
    Ensure {
        /// Project key (default: project_key from config)
        project_key: Option<String>,
    },
}

pub fn run(cmd: FilterCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        FilterCommands::Set { name, jql } => run_set(&name, &jql, global),
        FilterCommands::Show { identifier } => run_show(&identifier, global),
        FilterCommands::Ensure { project_key } => run_ensure(project_key, global),
    }
}

fn run_set(name: &str, jql: &str, global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    let filter = report_outcome(global, dashboard.create_or_update_filter(name, jql), |_| {
        "Filter created/updated!".to_string()
    })?;
    if !global.quiet && global.format == OutputFormat::Auto {
        println!("  ID:   {}", style(&filter.id).cyan());
        println!("  JQL:  {}", filter.query_text);
    }
    Ok(())
}

fn run_show(identifier: &str, global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    let filter = dashboard.show_filter(identifier)?;

    match global.format {
        OutputFormat::Json => print_json(&filter),
        OutputFormat::Yaml => print_yaml(&filter),
        OutputFormat::Tsv | OutputFormat::Csv => {
            println!("{}\t{}\t{}", filter.id, filter.name, filter.query_text);
            Ok(())
        }
        _ => {
            println!("{}", style(&filter.name).bold());
            println!("{}", style("─".repeat(40)).dim());
            println!("  ID:          {}", style(&filter.id).cyan());
            println!("  JQL:         {}", filter.query_text);
            if !filter.description.is_empty() {
                println!("  Description: {}", filter.description);
            }
            Ok(())
        }
    }
}

fn run_ensure(project_key: Option<String>, global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    let project_key = project_key
        .or_else(|| dashboard.config().project_key.clone())
        .ok_or_else(|| miette::miette!("No project key given and none configured (project_key)"))?;

    let filters = dashboard.ensure_category_filters(&project_key)?;

    match global.format {
        OutputFormat::Json => print_json(&filters),
        OutputFormat::Yaml => print_yaml(&filters),
        format => {
            let rows: Vec<Vec<String>> = filters
                .iter()
                .map(|(category, id)| vec![category.to_string(), category_filter_name(*category), id.clone()])
                .collect();
            print!("{}", render_table(&["Category", "Filter", "ID"], &rows, format));
            Ok(())
        }
    }
}
