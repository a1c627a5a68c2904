//! IP allowlist with single-address and CIDR entries.

use std::net::IpAddr;

use tracing::{debug, warn};

/// Parsed CIDR network range.
///
/// A bare address is stored as a full-length prefix (/32 or /128), which makes
/// membership identical to address equality. IPv4-mapped IPv6 addresses
/// (`::ffff:a.b.c.d`) are the same address as their IPv4 form on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidrRange {
    /// Network address
    network: IpAddr,
    /// Prefix length (e.g., 24 for /24)
    prefix_len: u8,
}

impl CidrRange {
    /// Parse a CIDR notation string (e.g., "10.0.0.0/8" or "::1/128") or a
    /// single address.
    ///
    /// Returns `None` if the format is invalid.
    pub fn parse(cidr: &str) -> Option<Self> {
        let cidr = cidr.trim();

        let Some((addr, prefix)) = cidr.split_once('/') else {
            let network: IpAddr = cidr.parse().ok()?;
            return Some(Self::mapped(network, max_prefix(&network)));
        };

        let network: IpAddr = addr.parse().ok()?;
        let prefix_len: u8 = prefix.parse().ok()?;

        if prefix_len > max_prefix(&network) {
            return None;
        }

        Some(Self::mapped(network, prefix_len))
    }

    /// Store a mapped range inside `::ffff:0:0/96` as the IPv4 range it covers.
    fn mapped(network: IpAddr, prefix_len: u8) -> Self {
        if let IpAddr::V6(v6) = network
            && prefix_len >= 96
            && let Some(v4) = v6.to_ipv4_mapped()
        {
            return Self {
                network: IpAddr::V4(v4),
                prefix_len: prefix_len - 96,
            };
        }

        Self {
            network,
            prefix_len,
        }
    }

    /// Check if an IP address is contained within this range.
    ///
    /// A mapped candidate matches IPv4 ranges through its IPv4 form and IPv6
    /// ranges (e.g. `::/0`) as written.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.contains_exact(ip) || self.contains_exact(&ip.to_canonical())
    }

    fn contains_exact(&self, ip: &IpAddr) -> bool {
        match (&self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(addr)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix_len)).unwrap_or(0);
                (u32::from(*net) & mask) == (u32::from(*addr) & mask)
            }
            (IpAddr::V6(net), IpAddr::V6(addr)) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(self.prefix_len)).unwrap_or(0);
                (u128::from(*net) & mask) == (u128::from(*addr) & mask)
            }
            // IPv4 and IPv6 don't match
            _ => false,
        }
    }

    /// Prefix length of the range.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }
}

fn max_prefix(ip: &IpAddr) -> u8 {
    match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

/// Ordered list of allowlisted ranges.
#[derive(Debug, Clone, Default)]
pub struct IpAllowlist {
    ranges: Vec<CidrRange>,
}

impl IpAllowlist {
    /// Build an allowlist from address or CIDR strings.
    ///
    /// Invalid entries are logged as warnings and skipped.
    pub fn new(entries: &[String]) -> Self {
        let ranges: Vec<CidrRange> = entries
            .iter()
            .filter_map(|entry| {
                let parsed = CidrRange::parse(entry);
                if parsed.is_none() {
                    warn!(entry = %entry, "Invalid IP or CIDR in allowlist, skipping");
                }
                parsed
            })
            .collect();

        if !ranges.is_empty() {
            debug!(count = ranges.len(), "IP allowlist configured");
        }

        Self { ranges }
    }

    /// Whether any usable entry survived parsing.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True if any candidate lies in any range.
    pub fn matches_any(&self, candidates: &[IpAddr]) -> bool {
        candidates
            .iter()
            .any(|ip| self.ranges.iter().any(|range| range.contains(ip)))
    }
}
