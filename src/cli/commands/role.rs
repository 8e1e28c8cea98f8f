//! `ipmirror role` command - Project role permissions on filters

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{open_dashboard, print_json, print_yaml, render_table, report_outcome};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::tracker::RoleKind;

#[derive(clap::Args, Debug)]
pub struct RoleArgs {
    /// Filter id
    pub filter_id: String,

    /// Project key, e.g. DS
    pub project_key: String,

    /// Project role name (case-insensitive)
    pub role_name: String,

    /// Viewer grants view access, editor grants view and edit
    #[arg(long, short = 'k', value_enum, default_value_t = RoleKind::Viewer)]
    pub kind: RoleKind,
}

#[derive(Subcommand, Debug)]
pub enum RoleCommands {
    /// Grant a project role access to a filter
    Add(RoleArgs),

    /// Remove a project role's grant from a filter
    Remove(RoleArgs),

    /// Remove every project, role, user, group, and global grant from a filter
    RemoveAll {
        /// Filter id
        filter_id: String,
    },

    /// List the grants on a filter
    List {
        /// Filter id
        filter_id: String,
    },
}

pub fn run(cmd: RoleCommands, global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    match cmd {
        RoleCommands::Add(args) => {
            let result = dashboard.grant_role(&args.filter_id, &args.project_key, &args.role_name, args.kind);
            report_outcome(global, result, |_| format!("{} role added!", capitalize(args.kind)))?;
        }
        RoleCommands::Remove(args) => {
            let result = dashboard.revoke_role(&args.filter_id, &args.project_key, &args.role_name, args.kind);
            let removed = report_outcome(global, result, |removed| {
                if *removed {
                    format!("{} role removed!", capitalize(args.kind))
                } else {
                    format!("No {} grant for {} on filter {}", args.kind, args.role_name, args.filter_id)
                }
            })?;
            if !removed && !global.quiet && global.format == OutputFormat::Auto {
                println!("  {}", style("Nothing matched; no change made").dim());
            }
        }
        RoleCommands::RemoveAll { filter_id } => {
            report_outcome(global, dashboard.revoke_all_roles(&filter_id), |n| {
                format!("All roles removed! ({} grant(s))", n)
            })?;
        }
        RoleCommands::List { filter_id } => {
            let grants = dashboard.list_roles(&filter_id)?;
            match global.format {
                OutputFormat::Json => print_json(&grants)?,
                OutputFormat::Yaml => print_yaml(&grants)?,
                format => {
                    let rows: Vec<Vec<String>> = grants
                        .iter()
                        .map(|g| {
                            vec![
                                g.id.clone(),
                                g.scope_type.to_string(),
                                g.project_id.clone().unwrap_or_default(),
                                g.role_id.clone().unwrap_or_default(),
                                access(g.can_view, g.can_edit).to_string(),
                            ]
                        })
                        .collect();
                    print!(
                        "{}",
                        render_table(&["ID", "Type", "Project", "Role", "Access"], &rows, format)
                    );
                }
            }
        }
    }
    Ok(())
}

fn capitalize(kind: RoleKind) -> &'static str {
    match kind {
        RoleKind::Viewer => "Viewer",
        RoleKind::Editor => "Editor",
    }
}

fn access(can_view: bool, can_edit: bool) -> &'static str {
    match (can_view, can_edit) {
        (_, true) => "edit",
        (true, false) => "view",
        (false, false) => "none",
    }
}
