//! `tabveil` command-line entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tabveil::cli;
use tabveil::config::{Config, ConfigArgs};
use tabveil::engine::Mode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabveil", version, about = "Disguise open browser tabs, then put them back")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    config: ConfigArgs,

    /// Machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Suppress human-readable output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Blank every tab's title and favicon
    Purge,
    /// Give every tab a random work-looking title and favicon
    Professional,
    /// Restore the original titles and favicons
    Undo,
    /// Show whether a disguise is in progress
    Status,
    /// List open tabs
    Tabs,
    /// Check and list the disguise profiles
    Mappings,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.json {
        std::env::set_var("TABVEIL_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("TABVEIL_QUIET", "1");
    }
    if cli.no_color {
        std::env::set_var("TABVEIL_NO_COLOR", "1");
    }

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tabveil={default_level}")));
    let logs = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.json {
        logs.json().init();
    } else {
        logs.init();
    }

    let config = Config::resolve(&cli.config);
    if let Err(e) = run(cli.command, &config).await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Purge => cli::apply_cmd::run_apply(config, Mode::PurgeAll).await,
        Command::Professional => cli::apply_cmd::run_apply(config, Mode::Professional).await,
        Command::Undo => cli::apply_cmd::run_undo(config).await,
        Command::Status => cli::status::run(config).await,
        Command::Tabs => cli::tabs_cmd::run(config).await,
        Command::Mappings => cli::mappings_cmd::run(config).await,
    }
}
