use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cu_cli::commands::{recipients, report};
use cu_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Reports go to stdout, so logs stay on stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match &cli.command {
        Some(Commands::Report {
            input,
            group_by,
            format,
        }) => {
            report::run(input, group_by.as_deref(), *format, &config)?;
        }
        Some(Commands::Recipients { input, separator }) => {
            recipients::run(input, separator, &config)?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
