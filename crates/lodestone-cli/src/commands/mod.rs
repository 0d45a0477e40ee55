//! Command implementations

mod config;
mod index;
mod snapshot;
mod task;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use lodestone_client::Lodestone;
use lodestone_core::config::{ClientConfig, CliConfigOverrides};
use std::path::Path;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Config => config::execute(&config, &output),
        Commands::Index(args) => {
            let client = build_client(config)?;
            index::execute(args, &client, &output).await
        }
        Commands::Snapshot(args) => {
            let client = build_client(config)?;
            snapshot::execute(args, &client, &output).await
        }
        Commands::Task(args) => {
            let client = build_client(config)?;
            task::execute(args, &client, &output).await
        }
    }
}

fn build_client(config: ClientConfig) -> Result<Lodestone> {
    Lodestone::new(config).context("Failed to build API client")
}

/// Resolve configuration with the precedence Default < File < Environment < CLI.
fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::with_defaults();

    if let Some(path) = &cli.config {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
    } else if Path::new("lodestone.toml").exists() {
        config = config
            .load_from_file("lodestone.toml")
            .context("Failed to load ./lodestone.toml")?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(CliConfigOverrides {
        api_base: cli.api_base.clone(),
        api_key: cli.api_key.clone(),
        space: cli.space.clone(),
        timeout_secs: cli.timeout_secs,
    });

    Ok(config)
}
