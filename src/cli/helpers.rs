//! Shared helper functions for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::dashboard::{ApiResponse, Dashboard};
use crate::core::error::SyncResult;
use crate::core::project::Project;

/// Find the workspace (if any) and build a dashboard from the layered config.
///
/// Without `--project`, running outside a workspace is fine: the global config
/// and environment still apply.
pub fn open_dashboard(global: &GlobalOpts) -> Result<Dashboard> {
    let project = match &global.project {
        Some(path) => Some(Project::discover_from(path).map_err(|e| miette::miette!("{}", e))?),
        None => Project::discover().ok(),
    };
    let config = Config::load(project.as_ref())?;
    Ok(Dashboard::new(config))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

pub fn print_yaml<T: Serialize>(value: &T) -> Result<()> {
    print!("{}", serde_yml::to_string(value).into_diagnostic()?);
    Ok(())
}

/// Print serializable records as CSV with a header row
pub fn print_csv<T: Serialize>(records: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    for record in records {
        writer.serialize(record).into_diagnostic()?;
    }
    writer.flush().into_diagnostic()?;
    Ok(())
}

/// Render rows as a table, or tab-separated lines for `--format tsv`
pub fn render_table(header: &[&str], rows: &[Vec<String>], format: OutputFormat) -> String {
    if format == OutputFormat::Tsv {
        return rows
            .iter()
            .map(|row| format!("{}\n", row.join("\t")))
            .collect();
    }

    let mut builder = Builder::default();
    builder.push_record(header.iter().copied());
    for row in rows {
        builder.push_record(row.iter().map(String::as_str));
    }
    let mut table = builder.build();
    match format {
        OutputFormat::Md => table.with(Style::markdown()),
        _ => table.with(Style::rounded()),
    };
    format!("{}\n", table)
}

/// Report the outcome of a tracker mutation.
///
/// `--format json` prints the `{status, message}` envelope; otherwise a styled
/// line. Errors still propagate so the exit code reflects them.
pub fn report_outcome<T>(
    global: &GlobalOpts,
    result: SyncResult<T>,
    message: impl FnOnce(&T) -> String,
) -> Result<T> {
    let response = ApiResponse::from_result(&result, message);
    match global.format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Yaml => print_yaml(&response)?,
        _ if response.is_success() && !global.quiet => {
            println!("{} {}", style("✓").green(), response.message)
        }
        _ => {}
    }
    Ok(result?)
}

/// Write content to a file, or stdout when no path is given
pub fn write_output(content: &str, output_path: Option<PathBuf>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(&path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            writer.flush().into_diagnostic()?;
            eprintln!(
                "{} Written to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
