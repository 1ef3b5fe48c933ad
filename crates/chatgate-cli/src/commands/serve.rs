//! Serve command - run the chat gateway

use anyhow::{Context, Result};
use chatgate_core::{Config, WhitelistPolicy};
use chatgate_service::{ApiServer, AppState, GenerationClient};
use clap::builder::BoolishValueParser;
use clap::{Args, Parser};
use std::net::SocketAddr;
use tracing::{info, warn};

/// Serve command arguments
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Listen address
    #[arg(short, long, env = "CHATGATE_BIND")]
    pub bind: Option<String>,

    /// Whitelist rules, comma-separated (ip.whitelist)
    #[arg(long, env = "IP_WHITELIST", value_name = "RULES")]
    pub ip_whitelist: Option<String>,

    /// Enable or disable the whitelist (ip.whitelist.enabled)
    #[arg(long, env = "IP_WHITELIST_ENABLED", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub ip_whitelist_enabled: Option<bool>,

    /// Generation API key
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Validate configuration and exit without serving
    #[arg(long, env = "CHATGATE_DRY_RUN")]
    pub dry_run: bool,
}

/// Serve arguments taken from the environment alone
#[derive(Parser, Debug)]
#[command(name = "chatgate", no_binary_name = true)]
struct EnvServeArgs {
    #[command(flatten)]
    serve: ServeArgs,
}

impl ServeArgs {
    /// Overrides for a bare `chatgate` run, where no serve flags exist
    pub fn from_env() -> Result<Self> {
        let parsed = EnvServeArgs::try_parse_from(std::iter::empty::<String>())
            .context("Invalid serve setting in environment")?;
        Ok(parsed.serve)
    }

    /// Apply command-line and environment overrides on top of the file config
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref bind) = self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(ref rules) = self.ip_whitelist {
            config.whitelist.rules = rules.clone();
        }
        if let Some(enabled) = self.ip_whitelist_enabled {
            config.whitelist.enabled = enabled;
        }
        if let Some(ref key) = self.api_key {
            config.generation.api_key = Some(key.clone());
        }
    }
}

/// Execute the serve command
pub fn execute(args: ServeArgs, mut config: Config) -> Result<()> {
    args.apply(&mut config);
    config.validate().context("Configuration validation failed")?;

    let bind: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.server.bind))?;

    let policy = WhitelistPolicy::from_config(&config.whitelist);
    info!(
        enabled = policy.is_enabled(),
        rule_count = policy.rules().len(),
        "IP whitelist ready"
    );

    let generator = GenerationClient::from_config(&config.generation)
        .context("Failed to set up generation client")?;
    info!(endpoint = generator.endpoint(), model = generator.model(), "Generation client ready");

    if args.dry_run {
        warn!("Dry run mode - not starting the server");
        info!("Configuration validated successfully");
        return Ok(());
    }

    print_banner(bind);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime
        .block_on(ApiServer::new(AppState { policy, generator }).run(bind, shutdown_signal()))
        .context("HTTP server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for interrupt signal");
        std::future::pending::<()>().await;
    }
    info!("Received interrupt signal, shutting down...");
}

fn print_banner(bind: SocketAddr) {
    use colored::Colorize;

    println!();
    println!("{}", "══════════════════════════════════════════".cyan());
    println!("  {}", "Chatgate".green().bold());
    println!("  {}", "IP-whitelisted chat gateway".white());
    println!("  Listening on {}", bind.to_string().cyan());
    println!("{}", "══════════════════════════════════════════".cyan());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_applied() {
        let args = ServeArgs {
            bind: Some("127.0.0.1:9001".to_string()),
            ip_whitelist: Some("10.0.0.0/8".to_string()),
            ip_whitelist_enabled: Some(false),
            api_key: Some("sk-cli".to_string()),
            dry_run: false,
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.server.bind, "127.0.0.1:9001");
        assert_eq!(config.whitelist.rules, "10.0.0.0/8");
        assert!(!config.whitelist.enabled);
        assert_eq!(config.generation.api_key.as_deref(), Some("sk-cli"));
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = Config::default();
        ServeArgs::default().apply(&mut config);
        assert_eq!(config.whitelist.rules, "127.0.0.1,localhost");
        assert!(config.whitelist.enabled);
    }

    #[test]
    fn test_dry_run_requires_api_key() {
        let args = ServeArgs {
            dry_run: true,
            ..ServeArgs::default()
        };
        assert!(execute(args, Config::default()).is_err());
    }

    #[test]
    fn test_dry_run_with_api_key() {
        let args = ServeArgs {
            api_key: Some("sk-dry".to_string()),
            dry_run: true,
            ..ServeArgs::default()
        };
        assert!(execute(args, Config::default()).is_ok());
    }
}
