//! URL safety validation for webload.
//!
//! This crate decides, before any request is made, whether a URL may be
//! fetched. A URL is allowed only when:
//! - its scheme is `http` or `https`
//! - it has a host
//! - the host is a public IP literal, or a name whose every resolved
//!   address is public
//!
//! Anything ambiguous (parse failure, resolution failure, an empty answer)
//! is treated as unsafe.
//!
//! # Example
//!
//! ```rust,ignore
//! use webload_ssrf::{StaticResolver, UrlSafetyValidator};
//!
//! let resolver = StaticResolver::new().with_host("example.com", ["8.8.8.8".parse()?]);
//! let validator = UrlSafetyValidator::with_resolver(resolver);
//!
//! assert!(validator.is_safe("https://example.com/").await);
//! assert!(!validator.is_safe("http://192.168.1.1/admin").await);
//! ```

pub mod dns;
pub mod ip_validation;
pub mod validator;

pub use dns::{ResolveError, Resolver, StaticResolver, SystemResolver};
pub use ip_validation::{AddressClass, AddressPolicy, classify_ip, is_blocked_ip};
pub use validator::{DEFAULT_DNS_TIMEOUT_SECS, UrlSafetyValidator, is_safe_url};

use std::net::IpAddr;

use thiserror::Error;

/// Why a URL was refused.
#[derive(Debug, Error)]
pub enum SsrfError {
    /// The input could not be parsed as a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Scheme other than http/https.
    #[error("Blocked scheme: {0} - only http and https are allowed")]
    BlockedScheme(String),

    /// The URL has no host component.
    #[error("Missing host in URL")]
    MissingHost,

    /// The host is, or resolves to, a non-public address.
    #[error("Blocked address: {host} -> {ip} ({class})")]
    BlockedAddress {
        host: String,
        ip: IpAddr,
        class: AddressClass,
    },

    /// The host name could not be resolved.
    #[error("DNS resolution failed for host {host}: {source}")]
    DnsResolutionFailed {
        host: String,
        #[source]
        source: ResolveError,
    },
}

impl SsrfError {
    /// Short, stable reason label for logs.
    pub fn reason(&self) -> &'static str {
        match self {
            SsrfError::InvalidUrl(_) => "invalid_url",
            SsrfError::BlockedScheme(_) => "blocked_scheme",
            SsrfError::MissingHost => "missing_host",
            SsrfError::BlockedAddress { .. } => "blocked_address",
            SsrfError::DnsResolutionFailed { .. } => "dns_resolution_failed",
        }
    }
}

/// Result type for validation.
pub type SsrfResult<T> = std::result::Result<T, SsrfError>;
