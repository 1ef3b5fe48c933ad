//! # Chatgate Core
//!
//! Address rule compiler and whitelist evaluator for the chatgate gateway.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Rule compilation** - comma-separated tokens to typed [`whitelist::Rule`]s
//! - **Whitelist evaluation** - allow/deny decisions over a [`whitelist::RuleSet`]
//! - **Address resolution** - literal parsing and bounded hostname lookups
//! - **Configuration** - TOML configuration for the whole gateway
//!
//! ## Example
//!
//! ```rust
//! use chatgate_core::resolve::LiteralResolver;
//! use chatgate_core::WhitelistPolicy;
//!
//! let policy = WhitelistPolicy::compile("10.0.0.0/8, localhost", true, LiteralResolver);
//!
//! assert!(policy.is_allowed("10.20.30.40"));
//! assert!(policy.is_allowed("127.0.0.1"));
//! assert!(!policy.is_allowed("192.168.1.1"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod resolve;
pub mod whitelist;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use resolve::{Resolver, SystemResolver};
pub use whitelist::{Decision, Rule, RuleSet, WhitelistPolicy};
