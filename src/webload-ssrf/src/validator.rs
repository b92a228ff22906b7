//! URL safety validator.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use url::{Host, Url};

use crate::dns::{ResolveError, Resolver, SystemResolver};
use crate::ip_validation::{AddressPolicy, is_blocked_ip};
use crate::{SsrfError, SsrfResult};

/// Default bound on a single host name lookup (10 seconds).
pub const DEFAULT_DNS_TIMEOUT_SECS: u64 = 10;

/// Decides whether a URL may be fetched.
///
/// Checks, in order: URL syntax, scheme (http/https only), presence of a
/// host, and the host's addresses. IP literals are classified directly;
/// names are resolved and every returned address must be public.
///
/// The check runs at call time only. A name that resolves to a public
/// address here and to a private one when the request is made (DNS
/// rebinding) is not caught.
#[derive(Clone)]
pub struct UrlSafetyValidator {
    resolver: Arc<dyn Resolver>,
    policy: AddressPolicy,
    dns_timeout: Duration,
}

impl UrlSafetyValidator {
    /// Create a validator using the system resolver and the standard policy.
    pub fn new() -> Self {
        Self::with_resolver(SystemResolver::new())
    }

    /// Create a validator with a custom resolver.
    pub fn with_resolver(resolver: impl Resolver + 'static) -> Self {
        Self::with_shared_resolver(Arc::new(resolver))
    }

    /// Create a validator sharing an existing resolver.
    pub fn with_shared_resolver(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver,
            policy: AddressPolicy::default(),
            dns_timeout: Duration::from_secs(DEFAULT_DNS_TIMEOUT_SECS),
        }
    }

    /// Set the address policy.
    pub fn policy(mut self, policy: AddressPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the lookup timeout.
    pub fn dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// Get the address policy.
    pub fn address_policy(&self) -> AddressPolicy {
        self.policy
    }

    /// Validate a URL, returning the parsed URL when it is safe to fetch.
    pub async fn validate(&self, input: &str) -> SsrfResult<Url> {
        let result = self.validate_inner(input).await;
        if let Err(e) = &result {
            tracing::warn!(url = input, reason = e.reason(), error = %e, "Refusing URL");
        }
        result
    }

    /// Check whether a URL is safe to fetch.
    pub async fn is_safe(&self, input: &str) -> bool {
        self.validate(input).await.is_ok()
    }

    async fn validate_inner(&self, input: &str) -> SsrfResult<Url> {
        let url = Url::parse(input)?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(SsrfError::BlockedScheme(scheme.to_string())),
        }

        match url.host() {
            None => return Err(SsrfError::MissingHost),
            Some(Host::Domain("")) => return Err(SsrfError::MissingHost),
            Some(Host::Ipv4(ip)) => self.check_ip(&ip.to_string(), IpAddr::V4(ip))?,
            Some(Host::Ipv6(ip)) => self.check_ip(&ip.to_string(), IpAddr::V6(ip))?,
            Some(Host::Domain(name)) => self.check_domain(name).await?,
        }

        Ok(url)
    }

    fn check_ip(&self, host: &str, ip: IpAddr) -> SsrfResult<()> {
        match is_blocked_ip(ip, self.policy) {
            Some(class) => Err(SsrfError::BlockedAddress {
                host: host.to_string(),
                ip,
                class,
            }),
            None => Ok(()),
        }
    }

    /// Resolve a name and require every address to be public.
    async fn check_domain(&self, host: &str) -> SsrfResult<()> {
        let resolved = tokio::time::timeout(self.dns_timeout, self.resolver.resolve(host)).await;

        let ips = match resolved {
            Ok(Ok(ips)) => ips,
            Ok(Err(source)) => {
                return Err(SsrfError::DnsResolutionFailed {
                    host: host.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(SsrfError::DnsResolutionFailed {
                    host: host.to_string(),
                    source: ResolveError::Timeout(self.dns_timeout),
                });
            }
        };

        if ips.is_empty() {
            return Err(SsrfError::DnsResolutionFailed {
                host: host.to_string(),
                source: ResolveError::NoAddresses,
            });
        }

        tracing::debug!(host, addresses = ips.len(), "Resolved host");

        for ip in ips {
            self.check_ip(host, ip)?;
        }
        Ok(())
    }
}

impl Default for UrlSafetyValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UrlSafetyValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSafetyValidator")
            .field("policy", &self.policy)
            .field("dns_timeout", &self.dns_timeout)
            .finish_non_exhaustive()
    }
}

/// Check a URL with the system resolver and the standard policy.
pub async fn is_safe_url(url: &str) -> bool {
    UrlSafetyValidator::new().is_safe(url).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AddressClass;
    use crate::dns::StaticResolver;

    fn validator() -> UrlSafetyValidator {
        UrlSafetyValidator::with_resolver(
            StaticResolver::new()
                .with_host("example.com", ["8.8.8.8".parse::<IpAddr>().unwrap()])
                .with_host("localhost", ["127.0.0.1".parse::<IpAddr>().unwrap()]),
        )
    }

    #[tokio::test]
    async fn test_blocked_schemes() {
        let v = validator();

        for url in [
            "file:///etc/passwd",
            "ftp://example.com",
            "gopher://example.com",
            "javascript:alert(1)",
            "data:text/html,hello",
        ] {
            let err = v.validate(url).await.unwrap_err();
            assert!(matches!(err, SsrfError::BlockedScheme(_)), "{url}: {err}");
        }
    }

    #[tokio::test]
    async fn test_malformed_urls() {
        let v = validator();

        assert!(matches!(
            v.validate("not a url").await,
            Err(SsrfError::InvalidUrl(_))
        ));
        assert!(matches!(
            v.validate("example.com/path").await,
            Err(SsrfError::InvalidUrl(_))
        ));
        assert!(matches!(
            v.validate("http://").await,
            Err(SsrfError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_literal_ip_classes() {
        let v = validator();

        let err = v.validate("http://192.168.1.1/admin").await.unwrap_err();
        assert!(matches!(
            err,
            SsrfError::BlockedAddress {
                class: AddressClass::Private,
                ..
            }
        ));

        let err = v.validate("http://[::1]:8080/").await.unwrap_err();
        assert!(matches!(
            err,
            SsrfError::BlockedAddress {
                class: AddressClass::Loopback,
                ..
            }
        ));

        let err = v.validate("http://0.0.0.0/").await.unwrap_err();
        assert!(matches!(
            err,
            SsrfError::BlockedAddress {
                class: AddressClass::Unspecified,
                ..
            }
        ));

        let err = v.validate("http://169.254.169.254/latest").await.unwrap_err();
        assert!(matches!(
            err,
            SsrfError::BlockedAddress {
                class: AddressClass::LinkLocal,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_public_literal_skips_resolution() {
        // Empty resolver: any lookup would fail.
        let v = UrlSafetyValidator::with_resolver(StaticResolver::new());
        assert!(v.is_safe("http://8.8.8.8/").await);
        assert!(v.is_safe("https://[2606:4700::1]/").await);
    }

    #[tokio::test]
    async fn test_numeric_host_forms_are_normalized() {
        let v = validator();
        // 2130706433 == 127.0.0.1; 0x7f.1 == 127.0.0.1
        assert!(!v.is_safe("http://2130706433/").await);
        assert!(!v.is_safe("http://0x7f.1/").await);
    }

    #[tokio::test]
    async fn test_resolved_names() {
        let v = validator();
        assert!(v.is_safe("https://example.com/page").await);
        assert!(v.is_safe("https://EXAMPLE.com").await);
        assert!(!v.is_safe("http://localhost:8080/admin").await);
    }

    #[tokio::test]
    async fn test_unresolvable_name_fails_closed() {
        let v = validator();
        let err = v.validate("https://unknown.example").await.unwrap_err();
        assert!(matches!(err, SsrfError::DnsResolutionFailed { .. }));
    }

    #[tokio::test]
    async fn test_strict_policy() {
        let resolver = StaticResolver::new()
            .with_host("cgnat.test", ["100.64.1.2".parse::<IpAddr>().unwrap()]);
        let standard = UrlSafetyValidator::with_resolver(resolver.clone());
        let strict = UrlSafetyValidator::with_resolver(resolver).policy(AddressPolicy::Strict);

        assert!(standard.is_safe("http://cgnat.test/").await);
        assert!(!strict.is_safe("http://cgnat.test/").await);
        assert!(!strict.is_safe("http://224.0.0.1/").await);
        assert_eq!(strict.address_policy(), AddressPolicy::Strict);
    }
}
