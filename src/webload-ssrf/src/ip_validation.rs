//! IP address classification for SSRF protection.
//!
//! The "private" ranges follow the IANA special-purpose address registries
//! (not globally reachable entries), including the registry's listed
//! exceptions. IPv4-mapped IPv6 addresses are classified by the embedded
//! IPv4 address.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

/// Non-public address categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressClass {
    /// `0.0.0.0` or `::`.
    Unspecified,

    /// 127.0.0.0/8 or `::1`.
    Loopback,

    /// 169.254.0.0/16 or fe80::/10.
    LinkLocal,

    /// Special-purpose, not globally reachable ranges (RFC 1918, documentation,
    /// benchmarking, reserved, unique local, ...).
    Private,

    /// 224.0.0.0/4 or ff00::/8.
    Multicast,

    /// 100.64.0.0/10 (RFC 6598, carrier-grade NAT).
    SharedAddressSpace,

    /// fec0::/10 (deprecated site-local).
    SiteLocal,
}

impl AddressClass {
    /// Whether the default policy blocks this class.
    pub fn is_standard(&self) -> bool {
        matches!(
            self,
            AddressClass::Unspecified
                | AddressClass::Loopback
                | AddressClass::LinkLocal
                | AddressClass::Private
        )
    }
}

impl std::fmt::Display for AddressClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressClass::Unspecified => write!(f, "unspecified"),
            AddressClass::Loopback => write!(f, "loopback"),
            AddressClass::LinkLocal => write!(f, "link-local"),
            AddressClass::Private => write!(f, "private"),
            AddressClass::Multicast => write!(f, "multicast"),
            AddressClass::SharedAddressSpace => write!(f, "shared address space"),
            AddressClass::SiteLocal => write!(f, "site-local"),
        }
    }
}

/// Which address classes are refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressPolicy {
    /// Refuse unspecified, loopback, link-local and private addresses.
    #[default]
    Standard,

    /// Additionally refuse multicast, shared address space and site-local.
    Strict,
}

impl AddressPolicy {
    /// Check if this policy refuses an address class.
    pub fn blocks(&self, class: AddressClass) -> bool {
        match self {
            AddressPolicy::Standard => class.is_standard(),
            AddressPolicy::Strict => true,
        }
    }
}

impl std::fmt::Display for AddressPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressPolicy::Standard => write!(f, "standard"),
            AddressPolicy::Strict => write!(f, "strict"),
        }
    }
}

const PRIVATE_V4: &[([u8; 4], u8)] = &[
    ([0, 0, 0, 0], 8),          // "this network" (RFC 791)
    ([10, 0, 0, 0], 8),         // RFC 1918
    ([127, 0, 0, 0], 8),        // loopback
    ([169, 254, 0, 0], 16),     // link-local
    ([172, 16, 0, 0], 12),      // RFC 1918
    ([192, 0, 0, 0], 24),       // IETF protocol assignments
    ([192, 0, 0, 170], 31),     // NAT64/DNS64 discovery
    ([192, 0, 2, 0], 24),       // TEST-NET-1
    ([192, 168, 0, 0], 16),     // RFC 1918
    ([198, 18, 0, 0], 15),      // benchmarking
    ([198, 51, 100, 0], 24),    // TEST-NET-2
    ([203, 0, 113, 0], 24),     // TEST-NET-3
    ([240, 0, 0, 0], 4),        // reserved
    ([255, 255, 255, 255], 32), // limited broadcast
];

// Globally reachable anycast services carved out of 192.0.0.0/24.
const PRIVATE_V4_EXCEPTIONS: &[([u8; 4], u8)] = &[([192, 0, 0, 9], 32), ([192, 0, 0, 10], 32)];

const PRIVATE_V6: &[(Ipv6Addr, u8)] = &[
    (Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1), 128),
    (Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 0), 128),
    (Ipv6Addr::new(0x64, 0xff9b, 1, 0, 0, 0, 0, 0), 48), // local-use NAT64
    (Ipv6Addr::new(0x100, 0, 0, 0, 0, 0, 0, 0), 64),     // discard-only
    (Ipv6Addr::new(0x2001, 0, 0, 0, 0, 0, 0, 0), 23),    // IETF protocol assignments
    (Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0), 32), // documentation
    (Ipv6Addr::new(0x2002, 0, 0, 0, 0, 0, 0, 0), 16),    // 6to4
    (Ipv6Addr::new(0x3fff, 0, 0, 0, 0, 0, 0, 0), 20),    // documentation (RFC 9637)
    (Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7),     // unique local
    (Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10),    // link-local
];

const PRIVATE_V6_EXCEPTIONS: &[(Ipv6Addr, u8)] = &[
    (Ipv6Addr::new(0x2001, 1, 0, 0, 0, 0, 0, 1), 128), // PCP anycast
    (Ipv6Addr::new(0x2001, 1, 0, 0, 0, 0, 0, 2), 128), // TURN anycast
    (Ipv6Addr::new(0x2001, 3, 0, 0, 0, 0, 0, 0), 32),  // AMT
    (Ipv6Addr::new(0x2001, 4, 0x112, 0, 0, 0, 0, 0), 48), // AS112-v6
    (Ipv6Addr::new(0x2001, 0x20, 0, 0, 0, 0, 0, 0), 28), // ORCHIDv2
    (Ipv6Addr::new(0x2001, 0x30, 0, 0, 0, 0, 0, 0), 28), // drone remote ID
];

/// Classify an IP address. Returns `None` for public addresses.
///
/// The four standard classes are checked first, so an address that is both
/// loopback and private reports `Loopback`.
pub fn classify_ip(ip: IpAddr) -> Option<AddressClass> {
    match ip {
        IpAddr::V4(ip) => classify_ipv4(ip),
        IpAddr::V6(ip) => classify_ipv6(ip),
    }
}

/// Classify an IP address and keep the class only if `policy` refuses it.
pub fn is_blocked_ip(ip: IpAddr, policy: AddressPolicy) -> Option<AddressClass> {
    classify_ip(ip).filter(|class| policy.blocks(*class))
}

fn classify_ipv4(ip: Ipv4Addr) -> Option<AddressClass> {
    if ip.is_unspecified() {
        return Some(AddressClass::Unspecified);
    }
    if ip.is_loopback() {
        return Some(AddressClass::Loopback);
    }
    if ip.is_link_local() {
        return Some(AddressClass::LinkLocal);
    }
    if is_private_ipv4(ip) {
        return Some(AddressClass::Private);
    }
    if ip.is_multicast() {
        return Some(AddressClass::Multicast);
    }
    if ipv4_in_cidr(ip, [100, 64, 0, 0], 10) {
        return Some(AddressClass::SharedAddressSpace);
    }
    None
}

fn classify_ipv6(ip: Ipv6Addr) -> Option<AddressClass> {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return classify_ipv4(v4);
    }

    if ip.is_unspecified() {
        return Some(AddressClass::Unspecified);
    }
    if ip.is_loopback() {
        return Some(AddressClass::Loopback);
    }
    if ipv6_in_cidr(ip, Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10) {
        return Some(AddressClass::LinkLocal);
    }
    if is_private_ipv6(ip) {
        return Some(AddressClass::Private);
    }
    if ip.is_multicast() {
        return Some(AddressClass::Multicast);
    }
    if ipv6_in_cidr(ip, Ipv6Addr::new(0xfec0, 0, 0, 0, 0, 0, 0, 0), 10) {
        return Some(AddressClass::SiteLocal);
    }
    None
}

fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    PRIVATE_V4
        .iter()
        .any(|(base, prefix)| ipv4_in_cidr(ip, *base, *prefix))
        && !PRIVATE_V4_EXCEPTIONS
            .iter()
            .any(|(base, prefix)| ipv4_in_cidr(ip, *base, *prefix))
}

fn is_private_ipv6(ip: Ipv6Addr) -> bool {
    PRIVATE_V6
        .iter()
        .any(|(base, prefix)| ipv6_in_cidr(ip, *base, *prefix))
        && !PRIVATE_V6_EXCEPTIONS
            .iter()
            .any(|(base, prefix)| ipv6_in_cidr(ip, *base, *prefix))
}

/// Check if IPv4 is in a CIDR range.
fn ipv4_in_cidr(ip: Ipv4Addr, base: [u8; 4], prefix: u8) -> bool {
    let ip = u32::from(ip);
    let base = u32::from(Ipv4Addr::from(base));
    let mask = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    };
    (ip & mask) == (base & mask)
}

/// Check if IPv6 is in a CIDR range.
fn ipv6_in_cidr(ip: Ipv6Addr, base: Ipv6Addr, prefix: u8) -> bool {
    let ip = u128::from(ip);
    let base = u128::from(base);
    let mask = if prefix == 0 {
        0
    } else {
        u128::MAX << (128 - prefix)
    };
    (ip & mask) == (base & mask)
}
