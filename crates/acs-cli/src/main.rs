use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use acs_cli::commands::report;
use acs_cli::{Cli, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    if cli.paths.is_empty() {
        tracing::error!("no report files or folders provided");
        std::process::exit(1);
    }

    let mut config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    tracing::debug!(?config, "loaded configuration");
    config.validate().context("invalid configuration")?;

    report::run(&cli.paths, &config, cli.sessions_json.as_deref())?;
    Ok(())
}
