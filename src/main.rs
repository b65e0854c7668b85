//! pressroom - build a Markdown blog and publish it.

mod artifact;
mod cli;
mod config;
mod content;
mod deploy;
mod generator;
mod init;
mod pipeline;
mod utils;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::{ConfigError, SiteConfig};
use init::new_site;
use pipeline::{Pipeline, PipelineError, RunMode};
use std::{path::Path, process::ExitCode};

/// Exit code for configuration and other failures outside a run.
const EXIT_OTHER: u8 = 1;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log!("error"; "{:#}", err);
            let code = err
                .downcast_ref::<PipelineError>()
                .map_or(EXIT_OTHER, PipelineError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    let mode = match &cli.command {
        Commands::Init { .. } => return new_site(&config),
        Commands::Check => {
            pipeline::check(&config)?;
            return Ok(());
        }
        Commands::Build { .. } => RunMode::Build,
        Commands::Deploy { .. } => RunMode::Deploy,
    };

    let report = Pipeline::new(&config, mode).run()?;
    let path: Vec<String> = report.history.iter().map(ToString::to_string).collect();
    log!("pipeline"; "{}", path.join(" -> "));
    log!(
        "done";
        "{} pages, {} files, digest {}, {}",
        report.pages,
        report.files,
        report.short_digest(),
        report.outcome
    );
    Ok(())
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() && !cli.is_init() {
        SiteConfig::from_path(&config_path)?
    } else {
        SiteConfig::default()
    };
    config.update_with_cli(cli);

    let config_exists = config.config_path.exists();
    match (cli.is_init(), config_exists) {
        (true, true) => bail!(ConfigError::Exists(config.config_path.clone())),
        (false, false) => bail!(ConfigError::Missing(config.config_path.clone())),
        _ => {}
    }

    if !cli.is_init() {
        config.validate(&cli.command)?;
    }

    Ok(config)
}
