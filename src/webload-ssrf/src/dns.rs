//! Host name resolution.
//!
//! The validator resolves names through the [`Resolver`] trait so that a
//! failed lookup is a distinct outcome, and so that callers can pin or
//! substitute answers.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Resolution failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The lookup itself failed.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// The lookup succeeded with no addresses.
    #[error("no addresses returned")]
    NoAddresses,

    /// The lookup did not finish in time.
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Resolves a host name to every address it maps to.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `host` to all of its addresses.
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

/// Resolver backed by the operating system (`getaddrinfo` via tokio).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        // The port is required by the lookup API and otherwise ignored.
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| ResolveError::Lookup(e.to_string()))?;

        let mut ips: Vec<IpAddr> = Vec::new();
        for addr in addrs {
            let ip = addr.ip();
            if !ips.contains(&ip) {
                ips.push(ip);
            }
        }

        if ips.is_empty() {
            return Err(ResolveError::NoAddresses);
        }
        Ok(ips)
    }
}

/// Resolver answering from a fixed table. Unknown hosts fail to resolve.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the answer for a host.
    pub fn with_host(
        mut self,
        host: impl Into<String>,
        ips: impl IntoIterator<Item = IpAddr>,
    ) -> Self {
        self.hosts
            .insert(host.into().to_lowercase(), ips.into_iter().collect());
        self
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        match self.hosts.get(&host.to_lowercase()) {
            Some(ips) if ips.is_empty() => Err(ResolveError::NoAddresses),
            Some(ips) => Ok(ips.clone()),
            None => Err(ResolveError::Lookup(format!("unknown host: {host}"))),
        }
    }
}
