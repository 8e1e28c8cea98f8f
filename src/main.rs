use clap::Parser;
use miette::Result;
use ipmirror::cli::{Cli, Commands, GlobalOpts};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&global))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init(args) => ipmirror::cli::commands::init::run(args),
        Commands::Summary(args) => ipmirror::cli::commands::summary::run(args, &global),
        Commands::Cases(args) => ipmirror::cli::commands::cases::run(args, &global),
        Commands::Refresh(args) => ipmirror::cli::commands::refresh::run(args, &global),
        Commands::Filter(cmd) => ipmirror::cli::commands::filter::run(cmd, &global),
        Commands::Purge(args) => ipmirror::cli::commands::purge::run(args, &global),
        Commands::Role(cmd) => ipmirror::cli::commands::role::run(cmd, &global),
        Commands::Project(cmd) => ipmirror::cli::commands::project::run(cmd, &global),
        Commands::Snapshot(cmd) => ipmirror::cli::commands::snapshot::run(cmd, &global),
        Commands::Completions(args) => ipmirror::cli::commands::completions::run(args),
    }
}

/// RUST_LOG wins, then IPMIRROR_LOG, then the --verbose/--quiet flags
fn log_filter(global: &GlobalOpts) -> tracing_subscriber::EnvFilter {
    let level = if let Ok(v) = std::env::var("RUST_LOG") {
        v
    } else if let Ok(v) = std::env::var("IPMIRROR_LOG") {
        match v.as_str() {
            "silent" => "off".to_string(),
            other => other.to_string(),
        }
    } else if global.verbose {
        "debug".to_string()
    } else if global.quiet {
        "error".to_string()
    } else {
        "warn".to_string()
    };

    tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}
