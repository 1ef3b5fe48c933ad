//! Whitelist inspection commands
//!
//! Compile the configured (or given) rules and show what they accept.

use anyhow::Result;
use chatgate_core::config::WhitelistConfig;
use chatgate_core::{Config, Decision, WhitelistPolicy};
use clap::{Args, Subcommand};
use colored::Colorize;

/// Whitelist arguments
#[derive(Args, Debug)]
pub struct WhitelistArgs {
    #[command(subcommand)]
    pub command: WhitelistCommands,
}

/// Whitelist subcommands
#[derive(Subcommand, Debug)]
pub enum WhitelistCommands {
    /// List the compiled whitelist rules
    List {
        /// Rules to compile instead of the configured ones
        #[arg(short, long)]
        rules: Option<String>,

        /// Only accept IP literals, never look up hostnames
        #[arg(long)]
        no_resolve: bool,
    },

    /// Check whether an address would be allowed
    Check {
        /// Address to check
        address: String,

        /// Rules to compile instead of the configured ones
        #[arg(short, long)]
        rules: Option<String>,

        /// Check as if the whitelist were disabled
        #[arg(long)]
        disabled: bool,

        /// Only accept IP literals, never look up hostnames
        #[arg(long)]
        no_resolve: bool,
    },
}

/// Execute whitelist command
pub fn execute(args: WhitelistArgs, config: &Config) -> Result<()> {
    match args.command {
        WhitelistCommands::List { rules, no_resolve } => {
            let settings = settings(config, rules, false, no_resolve);
            list_rules(&settings);
        }
        WhitelistCommands::Check {
            address,
            rules,
            disabled,
            no_resolve,
        } => {
            let settings = settings(config, rules, disabled, no_resolve);
            check_address(&settings, &address);
        }
    }
    Ok(())
}

/// Configured whitelist with command-line overrides applied
fn settings(
    config: &Config,
    rules: Option<String>,
    disabled: bool,
    no_resolve: bool,
) -> WhitelistConfig {
    let mut settings = config.whitelist.clone();
    if let Some(rules) = rules {
        settings.rules = rules;
    }
    if disabled {
        settings.enabled = false;
    }
    if no_resolve {
        settings.resolve_hostnames = false;
    }
    settings
}

fn list_rules(settings: &WhitelistConfig) {
    let policy = WhitelistPolicy::from_config(settings);

    println!("{}", "═".repeat(50).bright_blue());
    println!("{}", " IP Whitelist".bright_white().bold());
    println!("{}", "═".repeat(50).bright_blue());
    println!("Source: {}", settings.rules.cyan());
    println!(
        "Status: {}",
        if policy.is_enabled() {
            "enabled".green()
        } else {
            "disabled".dimmed()
        }
    );
    println!("Total rules: {}", policy.rules().len().to_string().green());
    println!("{}", "─".repeat(50).bright_black());

    if policy.rules().is_empty() {
        println!("{}", "  (empty - all addresses allowed)".dimmed());
    } else {
        for (index, rule) in policy.rules().iter().enumerate() {
            println!(
                "  {:>2}. {:<10} {}",
                index + 1,
                rule.kind().yellow(),
                rule
            );
        }
    }

    println!("{}", "═".repeat(50).bright_blue());
}

fn check_address(settings: &WhitelistConfig, address: &str) {
    let policy = WhitelistPolicy::from_config(settings);
    let decision = policy.evaluate(address);

    println!("{}", "─".repeat(50).bright_black());
    println!("Address: {}", address.cyan());
    println!("Rules: {}", settings.rules);
    println!(
        "Result: {}",
        match decision {
            Decision::Disabled => "Allowed (whitelist disabled)".green(),
            Decision::NoRules => "Allowed (no rules configured)".green(),
            Decision::Matched { index, rule } => {
                format!("Allowed (rule #{} {} [{}])", index + 1, rule, rule.kind()).green()
            }
            Decision::Denied => "Denied".red(),
        }
    );
    println!("{}", "─".repeat(50).bright_black());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_overrides() {
        let config = Config::default();

        let s = settings(&config, None, false, false);
        assert_eq!(s.rules, "127.0.0.1,localhost");
        assert!(s.enabled);
        assert!(s.resolve_hostnames);

        let s = settings(&config, Some("10.0.0.0/8".to_string()), true, true);
        assert_eq!(s.rules, "10.0.0.0/8");
        assert!(!s.enabled);
        assert!(!s.resolve_hostnames);
    }
}
