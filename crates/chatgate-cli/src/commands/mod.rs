//! CLI commands

pub mod completions;
pub mod config;
pub mod serve;
pub mod whitelist;

use anyhow::{Context, Result};
use chatgate_core::Config;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the chat gateway (default command)
    Serve(serve::ServeArgs),

    /// IP whitelist inspection
    Whitelist(whitelist::WhitelistArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Configuration file names searched in the working directory
const LOCAL_CONFIG_FILES: [&str; 2] = ["chatgate.toml", "config.toml"];

/// Candidate configuration file locations, in search order
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = LOCAL_CONFIG_FILES.iter().map(PathBuf::from).collect();

    if let Some(dirs) = directories::ProjectDirs::from("", "", "chatgate") {
        paths.push(dirs.config_dir().join("config.toml"));
    }

    paths
}

/// First existing configuration file, if any
pub fn find_config_file() -> Option<PathBuf> {
    config_search_paths().into_iter().find(|p| p.is_file())
}

/// Load the explicit config file, else the first one found, else defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match find_config_file() {
            Some(found) => found,
            None => {
                debug!("No configuration file found, using defaults");
                return Ok(Config::default());
            }
        },
    };

    Config::load(&path).with_context(|| format!("Failed to load config from {}", path.display()))
}
