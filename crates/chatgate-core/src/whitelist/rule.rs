//! Single address-matching rule

use once_cell::unsync::OnceCell;
use regex::Regex;
use std::fmt;
use tracing::warn;

use crate::resolve::{resolve_ipv4, Resolver};

/// IPv4 loopback literal accepted by the localhost alias
pub const IPV4_LOOPBACK: &str = "127.0.0.1";
/// IPv6 loopback literal (uncompressed form) accepted by the localhost alias
pub const IPV6_LOOPBACK: &str = "0:0:0:0:0:0:0:1";

/// Matches exactly one numeric dotted-quad segment
const SEGMENT_PATTERN: &str = "[0-9]{1,3}";

/// A compiled address-matching rule.
///
/// Rules are immutable once compiled and matching never fails: a candidate
/// that cannot be interpreted simply does not match.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Literal string equality
    Exact(String),
    /// IPv4 or IPv6 loopback literal
    LocalhostAlias,
    /// Dotted-quad pattern where `*` is a 1-3 digit segment
    WildcardPattern(Regex),
    /// IPv4 network block, already reduced to network value and mask
    CidrBlock {
        /// Base address with host bits cleared
        network: u32,
        /// Prefix mask
        mask: u32,
    },
}

impl Rule {
    /// Compile a single trimmed, non-empty configuration token.
    ///
    /// Precedence: CIDR (`/`), wildcard (`*`), `localhost`, exact. A token
    /// that looks like CIDR but cannot be parsed as one falls through to the
    /// next interpretation instead of being rejected.
    pub fn compile<R: Resolver + ?Sized>(token: &str, resolver: &R) -> Self {
        if token.contains('/') {
            if let Some(rule) = Self::cidr(token, resolver) {
                return rule;
            }
            warn!(token, "Invalid CIDR rule, falling back to literal matching");
        }

        if token.contains('*') {
            if let Some(rule) = Self::wildcard(token) {
                return rule;
            }
        }

        if token.eq_ignore_ascii_case("localhost") {
            return Self::LocalhostAlias;
        }

        Self::Exact(token.to_string())
    }

    /// Build a CIDR block rule, `None` if the token is not a usable IPv4 block
    ///
    /// Only the first two `/`-separated parts are read, so `10.0.0.0/24/x`
    /// is the same block as `10.0.0.0/24`.
    pub fn cidr<R: Resolver + ?Sized>(token: &str, resolver: &R) -> Option<Self> {
        let mut parts = token.split('/');
        let base = parts.next()?;
        let prefix: u8 = parts.next()?.parse().ok()?;
        if prefix > 32 {
            return None;
        }

        let base = resolve_ipv4(resolver, base)?;
        let mask = prefix_mask(prefix);

        Some(Self::CidrBlock {
            network: base & mask,
            mask,
        })
    }

    /// Build a wildcard rule from a dotted pattern such as `192.168.1.*`
    pub fn wildcard(token: &str) -> Option<Self> {
        let body = token
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(SEGMENT_PATTERN);

        match Regex::new(&format!("^{body}$")) {
            Ok(re) => Some(Self::WildcardPattern(re)),
            Err(e) => {
                warn!(token, error = %e, "Invalid wildcard rule");
                None
            }
        }
    }

    /// Check whether `candidate` satisfies this rule
    pub fn matches<R: Resolver + ?Sized>(&self, candidate: &str, resolver: &R) -> bool {
        self.matches_candidate(&Candidate::new(candidate, resolver))
    }

    /// Check a candidate whose IPv4 value may already be resolved
    pub fn matches_candidate<R: Resolver + ?Sized>(&self, candidate: &Candidate<'_, R>) -> bool {
        let text = candidate.as_str();
        match self {
            Self::Exact(literal) => literal == text,
            Self::LocalhostAlias => text == IPV4_LOOPBACK || text == IPV6_LOOPBACK,
            Self::WildcardPattern(re) => re.is_match(text),
            Self::CidrBlock { network, mask } => {
                candidate.ipv4().map_or(false, |addr| addr & mask == *network)
            }
        }
    }

    /// Short label for the rule variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Exact(_) => "exact",
            Self::LocalhostAlias => "localhost",
            Self::WildcardPattern(_) => "wildcard",
            Self::CidrBlock { .. } => "cidr",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(literal) => f.write_str(literal),
            Self::LocalhostAlias => f.write_str("localhost"),
            Self::WildcardPattern(re) => {
                let pattern = re.as_str();
                let body = pattern
                    .strip_prefix('^')
                    .and_then(|p| p.strip_suffix('$'))
                    .unwrap_or(pattern);
                f.write_str(&body.replace(SEGMENT_PATTERN, "*").replace("\\.", "."))
            }
            Self::CidrBlock { network, mask } => {
                let [a, b, c, d] = network.to_be_bytes();
                write!(f, "{a}.{b}.{c}.{d}/{}", mask.count_ones())
            }
        }
    }
}

/// Address under evaluation.
///
/// The IPv4 value is resolved on first use and then reused, so a hostname
/// candidate costs at most one lookup no matter how many CIDR rules it is
/// checked against.
pub struct Candidate<'a, R: Resolver + ?Sized> {
    text: &'a str,
    resolver: &'a R,
    ipv4: OnceCell<Option<u32>>,
}

impl<'a, R: Resolver + ?Sized> Candidate<'a, R> {
    /// Wrap `text` without resolving it yet
    pub fn new(text: &'a str, resolver: &'a R) -> Self {
        Self {
            text,
            resolver,
            ipv4: OnceCell::new(),
        }
    }

    /// Candidate text as given
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// IPv4 value of the candidate, looked up at most once
    pub fn ipv4(&self) -> Option<u32> {
        *self
            .ipv4
            .get_or_init(|| resolve_ipv4(self.resolver, self.text))
    }
}

/// Mask for a prefix length of 0-32; a zero prefix matches every address
fn prefix_mask(prefix: u8) -> u32 {
    u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0)
}
