use anyhow::Context;
use clap::Parser;
use tracing::debug;

use pricing_cli::cli::Cli;
use pricing_cli::config::Settings;
use pricing_cli::{app, logging};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    debug!(?settings, "settings loaded");

    let report = app::run(&cli, &settings)?;
    print!("{report}");

    Ok(())
}
