//! Chatgate CLI
//!
//! Command-line interface for the IP-whitelisted chat gateway.

mod args;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use chatgate_core::Config;
use tracing::error;

use args::Args;
use commands::Command;

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Config comes first so the logging section can take effect
    let config = commands::load_config(args.config.as_deref())?;

    // Initialize logging
    logging::init(&args, &config.logging)?;

    // Run the main logic
    let result = run(args, config);

    if let Err(ref e) = result {
        error!("Fatal error: {:#}", e);
    }

    result
}

fn run(args: Args, config: Config) -> Result<()> {
    match args.command {
        Some(Command::Serve(serve_args)) => commands::serve::execute(serve_args, config),
        Some(Command::Whitelist(whitelist_args)) => {
            commands::whitelist::execute(whitelist_args, &config)
        }
        Some(Command::Config(config_args)) => commands::config::execute(config_args, &config),
        Some(Command::Completions(comp_args)) => commands::completions::execute(comp_args),
        None => commands::serve::execute(commands::serve::ServeArgs::from_env()?, config),
    }
}
