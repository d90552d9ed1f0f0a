//! Address plumbing for the discovery strategy.
//!
//! Two concerns live here: turning the textual addresses an inventory
//! reports into IP addresses, and working out which address identifies
//! the local machine.  Inventory addresses are usually IP literals;
//! anything that is not parses as a hostname and goes through
//! [hickory-resolver](https://crates.io/crates/hickory-resolver).

use std::env;
use std::net::IpAddr;

use hickory_resolver::TokioAsyncResolver;
use log::warn;

use crate::error::DiscoveryError;

/// Resolves inventory address strings to IP addresses.
///
/// The underlying DNS resolver is created lazily on the first lookup that
/// actually needs DNS, so inventories made purely of IP literals never
/// touch the system resolver configuration.
pub struct AddressResolver {
    inner: Option<TokioAsyncResolver>,
}

impl AddressResolver {
    pub fn new() -> Self {
        Self { inner: None }
    }

    /// Resolves one textual address.  Failure of any kind maps to a
    /// configuration error naming the offending address.
    pub async fn resolve(&mut self, address: &str) -> Result<IpAddr, DiscoveryError> {
        if let Ok(ip) = address.parse::<IpAddr>() {
            return Ok(ip);
        }
        // A malformed IP literal ("257.0.0.1") must not be retried as a
        // hostname lookup.
        if looks_like_ip_literal(address) {
            return Err(DiscoveryError::invalid_address(address));
        }

        if self.inner.is_none() {
            let resolver = TokioAsyncResolver::tokio_from_system_conf()
                .map_err(|_| DiscoveryError::invalid_address(address))?;
            self.inner = Some(resolver);
        }
        let resolver = self
            .inner
            .as_ref()
            .ok_or_else(|| DiscoveryError::invalid_address(address))?;

        resolver
            .lookup_ip(address)
            .await
            .ok()
            .and_then(|lookup| lookup.iter().next())
            .ok_or_else(|| DiscoveryError::invalid_address(address))
    }
}

impl Default for AddressResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Determines the local machine's primary address.
///
/// Walks all interfaces skipping loopback, preferring the first
/// site-local address and falling back to the first non-loopback one.
/// When no interface yields anything, the machine hostname (from the
/// `HOSTNAME` environment variable) is resolved as a last resort.  Every
/// failure degrades to `None` with a warning; callers must cope with an
/// unknown local address.
pub async fn local_primary_address(resolver: &mut AddressResolver) -> Option<IpAddr> {
    let interfaces = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            warn!("Failed to enumerate network interfaces: {}", e);
            return None;
        }
    };

    if let Some(ip) = select_address(interfaces.iter().map(|iface| iface.ip())) {
        return Some(ip);
    }

    if let Ok(hostname) = env::var("HOSTNAME") {
        if let Ok(ip) = resolver.resolve(&hostname).await {
            return Some(ip);
        }
    }

    warn!("Failed to determine local host address");
    None
}

/// Picks the preferred address out of an interface scan: first site-local
/// wins, otherwise the first non-loopback address seen.
fn select_address<I>(addresses: I) -> Option<IpAddr>
where
    I: IntoIterator<Item = IpAddr>,
{
    let mut candidate = None;
    for ip in addresses {
        if ip.is_loopback() {
            continue;
        }
        if is_site_local(&ip) {
            return Some(ip);
        }
        if candidate.is_none() {
            candidate = Some(ip);
        }
    }
    candidate
}

/// Private/internal ranges: RFC 1918 for IPv4, unique-local (fc00::/7)
/// for IPv6.
fn is_site_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private(),
        IpAddr::V6(v6) => (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

/// True for strings shaped like an IP literal, whether or not they parse.
fn looks_like_ip_literal(address: &str) -> bool {
    if address.is_empty() {
        return false;
    }
    if address.contains(':') {
        return address
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.');
    }
    address.chars().all(|c| c.is_ascii_digit() || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[tokio::test]
    async fn ip_literals_resolve_without_dns() {
        let mut resolver = AddressResolver::new();
        let ip = resolver.resolve("10.1.2.3").await.unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)));
        // No lookup happened, so the lazy resolver stays unset.
        assert!(resolver.inner.is_none());
    }

    #[tokio::test]
    async fn malformed_literal_is_a_configuration_error() {
        let mut resolver = AddressResolver::new();
        let err = resolver.resolve("257.0.0.1").await.unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::InvalidConfiguration { ref address } if address == "257.0.0.1"
        ));
    }

    #[test]
    fn site_local_is_preferred_over_earlier_public() {
        let picked = select_address(vec![
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)),
        ]);
        assert_eq!(picked, Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))));
    }

    #[test]
    fn first_non_loopback_is_the_fallback() {
        let picked = select_address(vec![
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)),
            IpAddr::V4(Ipv4Addr::new(198, 51, 100, 2)),
        ]);
        assert_eq!(picked, Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9))));
    }

    #[test]
    fn loopback_only_yields_nothing() {
        let picked = select_address(vec![
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
        ]);
        assert_eq!(picked, None);
    }

    #[test]
    fn unique_local_v6_counts_as_site_local() {
        let ula: Ipv6Addr = "fd12:3456:789a::1".parse().unwrap();
        assert!(is_site_local(&IpAddr::V6(ula)));
        let global: Ipv6Addr = "2001:db8::1".parse().unwrap();
        assert!(!is_site_local(&IpAddr::V6(global)));
    }

    #[test]
    fn hostnames_are_not_ip_literals() {
        assert!(looks_like_ip_literal("257.0.0.1"));
        assert!(looks_like_ip_literal("1.2.3.4.5"));
        assert!(!looks_like_ip_literal("node-1.internal"));
        assert!(!looks_like_ip_literal("localhost"));
    }
}
