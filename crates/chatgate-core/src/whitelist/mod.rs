//! IP whitelist
//!
//! Turns a comma-separated rule string into a [`RuleSet`] and answers the
//! single question the HTTP layer asks: may this address proceed?
//!
//! Supported rule tokens:
//! - Exact addresses: `203.0.113.5`
//! - Wildcard segments: `192.168.1.*` (each `*` is a 1-3 digit segment)
//! - CIDR blocks: `10.0.0.0/8` (IPv4 only; the base may be a hostname)
//! - The `localhost` alias: `127.0.0.1` or `0:0:0:0:0:0:0:1`
//!
//! Malformed tokens never fail compilation; a broken CIDR block degrades to
//! a literal match on the token text.

mod policy;
mod rule;
mod ruleset;

pub use policy::{Decision, WhitelistPolicy};
pub use rule::{Candidate, Rule, IPV4_LOOPBACK, IPV6_LOOPBACK};
pub use ruleset::RuleSet;
