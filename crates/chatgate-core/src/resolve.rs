//! Address resolution
//!
//! CIDR rules compare addresses numerically, so both the configured base
//! address and the candidate have to be turned into a 32-bit IPv4 value.
//! Resolution never fails loudly: anything that cannot be resolved simply
//! yields `None` and the rule that asked does not match.

use std::fmt;
use std::io;
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Default upper bound for a single name lookup
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Blocking name lookup run on the resolver's helper thread
pub type LookupFn = fn(&str) -> io::Result<Vec<IpAddr>>;

/// Name lookup through the operating system resolver
pub fn system_lookup(host: &str) -> io::Result<Vec<IpAddr>> {
    Ok((host, 0).to_socket_addrs()?.map(|a| a.ip()).collect())
}

/// Turns a textual host into an IP address
#[cfg_attr(test, mockall::automock)]
pub trait Resolver: Send + Sync {
    /// Resolve `host`, returning `None` on any failure
    fn lookup(&self, host: &str) -> Option<IpAddr>;
}

impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    fn lookup(&self, host: &str) -> Option<IpAddr> {
        (**self).lookup(host)
    }
}

/// Reduce an address to its 32-bit IPv4 value.
///
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) count as IPv4. Every other
/// IPv6 address has no IPv4 value.
pub fn ipv4_value(addr: IpAddr) -> Option<u32> {
    match addr {
        IpAddr::V4(v4) => Some(u32::from(v4)),
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(u32::from),
    }
}

/// Resolve `host` and reduce it to an IPv4 value in one step
pub fn resolve_ipv4<R: Resolver + ?Sized>(resolver: &R, host: &str) -> Option<u32> {
    resolver.lookup(host).and_then(ipv4_value)
}

/// Parse an IP literal, accepting the bracketed IPv6 form as well
fn parse_literal(host: &str) -> Option<IpAddr> {
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    host.parse().ok()
}

/// Resolver that only understands IP literals and never touches the network
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralResolver;

impl Resolver for LiteralResolver {
    fn lookup(&self, host: &str) -> Option<IpAddr> {
        if host.is_empty() {
            return None;
        }
        parse_literal(host)
    }
}

/// Resolver backed by the operating system's name lookup.
///
/// Literals are parsed directly. Hostnames are looked up on a helper thread
/// and the caller waits at most `timeout`; a lookup that outlives the timeout
/// is abandoned and treated as a failure.
#[derive(Clone)]
pub struct SystemResolver {
    resolve_hostnames: bool,
    timeout: Duration,
    lookup: LookupFn,
}

impl fmt::Debug for SystemResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemResolver")
            .field("resolve_hostnames", &self.resolve_hostnames)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new(true, DEFAULT_RESOLVE_TIMEOUT)
    }
}

impl SystemResolver {
    /// Create a resolver
    pub fn new(resolve_hostnames: bool, timeout: Duration) -> Self {
        Self {
            resolve_hostnames,
            timeout,
            lookup: system_lookup,
        }
    }

    /// Replace the blocking lookup, e.g. with a static host table
    pub fn with_lookup(mut self, lookup: LookupFn) -> Self {
        self.lookup = lookup;
        self
    }

    /// Whether hostnames (not just literals) are looked up
    pub fn resolves_hostnames(&self) -> bool {
        self.resolve_hostnames
    }

    /// Lookup timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn lookup_host(&self, host: &str) -> Option<IpAddr> {
        let (tx, rx) = mpsc::channel();
        let name = host.to_string();
        let lookup = self.lookup;

        let spawned = thread::Builder::new()
            .name("chatgate-resolve".to_string())
            .spawn(move || {
                // Receiver is gone if the caller already timed out
                let _ = tx.send(lookup(&name));
            });
        if let Err(e) = spawned {
            debug!(host, error = %e, "Failed to spawn resolver thread");
            return None;
        }

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(addrs)) => {
                // Prefer IPv4, like most system resolvers hand them out
                let picked = addrs
                    .iter()
                    .find(|a| a.is_ipv4())
                    .or_else(|| addrs.first())
                    .copied();
                debug!(host, resolved = ?picked, "Resolved host");
                picked
            }
            Ok(Err(e)) => {
                debug!(host, error = %e, "Host lookup failed");
                None
            }
            Err(_) => {
                debug!(host, timeout_ms = self.timeout.as_millis() as u64, "Host lookup timed out");
                None
            }
        }
    }
}

impl Resolver for SystemResolver {
    fn lookup(&self, host: &str) -> Option<IpAddr> {
        if host.is_empty() {
            return None;
        }
        if let Some(addr) = parse_literal(host) {
            return Some(addr);
        }
        if !self.resolve_hostnames {
            return None;
        }
        self.lookup_host(host)
    }
}
