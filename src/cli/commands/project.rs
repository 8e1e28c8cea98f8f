//! `ipmirror project` command - Tracker project lookups

use clap::Subcommand;
use miette::Result;

use crate::cli::helpers::{open_dashboard, print_json, print_yaml};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List the role names defined in a project
    Roles {
        /// Project key, e.g. DS
        project_key: String,
    },

    /// List the keys of every visible project
    Keys,
}

pub fn run(cmd: ProjectCommands, global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    let names = match cmd {
        ProjectCommands::Roles { project_key } => dashboard.project_roles(&project_key)?,
        ProjectCommands::Keys => dashboard.project_keys()?,
    };

    match global.format {
        OutputFormat::Json => print_json(&names),
        OutputFormat::Yaml => print_yaml(&names),
        _ => {
            for name in &names {
                println!("{}", name);
            }
            Ok(())
        }
    }
}
