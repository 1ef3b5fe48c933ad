//! Config command - configuration management

use anyhow::{Context, Result};
use chatgate_core::{Config, WhitelistPolicy};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use tracing::info;

use super::{config_search_paths, find_config_file};

/// Config command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Generate a configuration file with defaults
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "chatgate.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Config file to validate
        file: PathBuf,
    },

    /// Show config file locations
    Paths,
}

/// Execute config command
pub fn execute(args: ConfigArgs, config: &Config) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(config),
        ConfigAction::Generate { output, force } => generate_config(output, force),
        ConfigAction::Validate { file } => validate_config(file),
        ConfigAction::Paths => show_paths(),
    }
}

fn show_config(config: &Config) -> Result<()> {
    // Never echo the API key
    let mut shown = config.clone();
    if shown.generation.api_key.is_some() {
        shown.generation.api_key = Some("********".to_string());
    }

    let toml_str = shown.to_toml().context("Failed to serialize config")?;
    println!("{toml_str}");
    Ok(())
}

fn generate_config(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    let toml_str = Config::default()
        .to_toml()
        .context("Failed to serialize config")?;

    // Add header comment
    let content = format!(
        "# Chatgate Configuration\n\
         #\n\
         # whitelist.rules: comma-separated tokens, each one of\n\
         #   exact address (203.0.113.5), wildcard (192.168.1.*),\n\
         #   CIDR block (10.0.0.0/8) or the alias localhost\n\
         # generation.api_key may also come from DEEPSEEK_API_KEY\n\n\
         {toml_str}"
    );

    std::fs::write(&output, content)
        .with_context(|| format!("Failed to write config to {}", output.display()))?;

    info!(path = %output.display(), "Generated config file");
    println!("Configuration file generated: {}", output.display());

    Ok(())
}

fn validate_config(file: PathBuf) -> Result<()> {
    let config = Config::load(&file)
        .with_context(|| format!("Failed to load config from {}", file.display()))?;

    config.validate().context("Configuration validation failed")?;

    let policy = WhitelistPolicy::from_config(&config.whitelist);

    println!("✓ Configuration is valid");
    println!("  Listen address: {}", config.server.bind);
    println!("  Whitelist enabled: {}", policy.is_enabled());
    println!("  Whitelist rules: {}", policy.rules().len());
    println!("  Model: {}", config.generation.model);
    println!(
        "  API key: {}",
        if config.generation.api_key.is_some() {
            "set"
        } else {
            "not set (DEEPSEEK_API_KEY required to serve)"
        }
    );

    Ok(())
}

fn show_paths() -> Result<()> {
    println!("Configuration file search paths:");
    println!();

    for (i, path) in config_search_paths().iter().enumerate() {
        println!("  {}. {}", i + 1, path.display());
    }

    println!();
    match find_config_file() {
        Some(path) => println!("Active: {}", path.display()),
        None => println!("Active: (none, using defaults)"),
    }

    Ok(())
}
