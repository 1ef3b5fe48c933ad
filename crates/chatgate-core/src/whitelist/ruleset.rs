//! Rule compiler: configuration string to ordered rule set

use std::slice;
use tracing::{debug, info};

use super::rule::{Candidate, Rule};
use crate::resolve::Resolver;

/// Ordered collection of rules, evaluated as "any rule matches".
///
/// Order follows the configuration string; duplicates are kept.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create a rule set from already compiled rules
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile a comma-separated rule string.
    ///
    /// Tokens are trimmed and empty tokens are dropped. An empty or blank
    /// string yields an empty set. Compilation never fails.
    pub fn compile<R: Resolver + ?Sized>(config: &str, resolver: &R) -> Self {
        let rules: Vec<Rule> = config
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                let rule = Rule::compile(token, resolver);
                debug!(token, kind = rule.kind(), rule = %rule, "Compiled whitelist rule");
                rule
            })
            .collect();

        info!(count = rules.len(), "Compiled whitelist rules");
        Self { rules }
    }

    /// Compile a rule string that may be absent
    pub fn compile_optional<R: Resolver + ?Sized>(config: Option<&str>, resolver: &R) -> Self {
        config.map_or_else(Self::default, |c| Self::compile(c, resolver))
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set holds no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over the rules in configuration order
    pub fn iter(&self) -> slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// First rule matching `candidate`, with its position.
    ///
    /// The candidate is resolved at most once for the whole scan.
    pub fn first_match<R: Resolver + ?Sized>(
        &self,
        candidate: &str,
        resolver: &R,
    ) -> Option<(usize, &Rule)> {
        let candidate = Candidate::new(candidate, resolver);
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches_candidate(&candidate))
    }

    /// Whether any rule matches `candidate`
    pub fn matches_any<R: Resolver + ?Sized>(&self, candidate: &str, resolver: &R) -> bool {
        self.first_match(candidate, resolver).is_some()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
