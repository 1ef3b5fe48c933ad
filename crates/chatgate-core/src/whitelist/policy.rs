//! Whitelist evaluator

use tracing::{debug, info};

use super::rule::Rule;
use super::ruleset::RuleSet;
use crate::config::WhitelistConfig;
use crate::resolve::{Resolver, SystemResolver};

/// Outcome of a whitelist check
#[derive(Debug, Clone, Copy)]
pub enum Decision<'a> {
    /// Whitelist switched off, everything is allowed
    Disabled,
    /// No rules configured, everything is allowed
    NoRules,
    /// A rule matched the candidate
    Matched {
        /// Position of the rule in the rule set
        index: usize,
        /// The matching rule
        rule: &'a Rule,
    },
    /// No rule matched
    Denied,
}

impl Decision<'_> {
    /// Whether the request may proceed
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Denied)
    }
}

/// Enabled flag plus compiled rules.
///
/// Built once at startup and shared read-only; evaluation takes `&self`.
#[derive(Debug)]
pub struct WhitelistPolicy<R: Resolver = SystemResolver> {
    rules: RuleSet,
    enabled: bool,
    resolver: R,
}

impl WhitelistPolicy<SystemResolver> {
    /// Build the policy described by the whitelist configuration
    pub fn from_config(config: &WhitelistConfig) -> Self {
        let resolver = config.resolver();
        Self::compile(&config.rules, config.enabled, resolver)
    }
}

impl<R: Resolver> WhitelistPolicy<R> {
    /// Create a policy from an already compiled rule set
    pub fn new(rules: RuleSet, enabled: bool, resolver: R) -> Self {
        Self {
            rules,
            enabled,
            resolver,
        }
    }

    /// Compile `config` and wrap it into a policy
    pub fn compile(config: &str, enabled: bool, resolver: R) -> Self {
        let rules = RuleSet::compile(config, &resolver);
        if !enabled {
            info!("IP whitelist disabled, all addresses allowed");
        } else if rules.is_empty() {
            info!("IP whitelist has no rules, all addresses allowed");
        }
        Self::new(rules, enabled, resolver)
    }

    /// Whether the whitelist is switched on
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Compiled rules
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Resolver used for CIDR rules
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Evaluate `candidate` and report why it was allowed or denied
    pub fn evaluate(&self, candidate: &str) -> Decision<'_> {
        if !self.enabled {
            return Decision::Disabled;
        }
        if self.rules.is_empty() {
            return Decision::NoRules;
        }

        match self.rules.first_match(candidate, &self.resolver) {
            Some((index, rule)) => {
                debug!(candidate, index, rule = %rule, "Address matched whitelist rule");
                Decision::Matched { index, rule }
            }
            None => {
                info!(candidate, "Address not in whitelist");
                Decision::Denied
            }
        }
    }

    /// Whether `candidate` may proceed
    pub fn is_allowed(&self, candidate: &str) -> bool {
        self.evaluate(candidate).is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{LiteralResolver, MockResolver};

    fn policy(config: &str, enabled: bool) -> WhitelistPolicy<LiteralResolver> {
        WhitelistPolicy::compile(config, enabled, LiteralResolver)
    }

    #[test]
    fn test_disabled_allows_everything() {
        let p = policy("10.0.0.1", false);
        assert!(matches!(p.evaluate("8.8.8.8"), Decision::Disabled));
        assert!(p.is_allowed("8.8.8.8"));
        assert!(p.is_allowed(""));
    }

    #[test]
    fn test_empty_rules_allow_everything() {
        let p = policy("", true);
        assert!(matches!(p.evaluate("8.8.8.8"), Decision::NoRules));
        assert!(p.is_allowed("anything at all"));
    }

    #[test]
    fn test_default_whitelist() {
        let p = policy(crate::config::DEFAULT_WHITELIST, true);
        assert!(p.is_allowed("127.0.0.1"));
        assert!(p.is_allowed("0:0:0:0:0:0:0:1"));
        assert!(!p.is_allowed("192.168.1.10"));
    }

    #[test]
    fn test_matched_decision_carries_rule() {
        let p = policy("10.0.0.1, 172.16.0.0/12", true);
        match p.evaluate("172.31.255.1") {
            Decision::Matched { index, rule } => {
                assert_eq!(index, 1);
                assert_eq!(rule.kind(), "cidr");
            }
            other => panic!("expected match, got {other:?}"),
        }
        assert!(matches!(p.evaluate("172.32.0.1"), Decision::Denied));
    }

    #[test]
    fn test_disabled_policy_never_resolves() {
        let mut mock = MockResolver::new();
        mock.expect_lookup().returning(|_| None);
        let rules = RuleSet::new(vec![Rule::CidrBlock {
            network: 0,
            mask: 0,
        }]);

        let mut strict = MockResolver::new();
        strict.expect_lookup().times(0);
        let p = WhitelistPolicy::new(rules.clone(), false, strict);
        assert!(p.is_allowed("example.com"));

        let p = WhitelistPolicy::new(rules, true, mock);
        assert!(!p.is_allowed("example.com"));
    }

    #[test]
    fn test_from_config() {
        let config = WhitelistConfig {
            rules: "192.168.1.*".to_string(),
            enabled: true,
            resolve_hostnames: false,
            resolve_timeout_ms: 100,
        };
        let p = WhitelistPolicy::from_config(&config);
        assert!(p.is_enabled());
        assert_eq!(p.rules().len(), 1);
        assert!(p.is_allowed("192.168.1.77"));
        assert!(!p.is_allowed("127.0.0.1"));
    }

    #[test]
    fn test_policy_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WhitelistPolicy>();
        assert_send_sync::<WhitelistPolicy<LiteralResolver>>();
    }
}
