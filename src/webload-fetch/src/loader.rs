//! Validate, fetch, extract, filter.

use std::fmt;
use std::sync::Arc;

use webload_ssrf::{Resolver, UrlSafetyValidator};

use crate::client::{FetchRequest, PageClient, ReqwestPageClient};
use crate::config::{ConfigError, LoadWebPageConfig};
use crate::extract::{decode_body, html_to_text};
use crate::filter::filter_short_lines;
use crate::outcome::{LoadOutcome, RESTRICTED_MESSAGE, fetch_failed_message};

/// Loads a web page as filtered plain text, refusing URLs that point at
/// non-public addresses.
///
/// The loader holds no per-call state and can be shared between tasks.
#[derive(Clone)]
pub struct WebPageLoader {
    validator: UrlSafetyValidator,
    client: Arc<dyn PageClient>,
    config: LoadWebPageConfig,
}

impl WebPageLoader {
    /// Loader with default settings, the system resolver and a reqwest client.
    pub fn new() -> Self {
        Self::build(LoadWebPageConfig::default())
    }

    /// Loader for `config`. Fails if the config would disable a timeout.
    pub fn from_config(config: LoadWebPageConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: LoadWebPageConfig) -> Self {
        let validator = Self::validator_for(UrlSafetyValidator::new(), &config);
        let client = Arc::new(ReqwestPageClient::from_config(&config));
        Self {
            validator,
            client,
            config,
        }
    }

    fn validator_for(
        validator: UrlSafetyValidator,
        config: &LoadWebPageConfig,
    ) -> UrlSafetyValidator {
        validator
            .policy(config.address_policy)
            .dns_timeout(config.dns_timeout())
    }

    /// Resolve host names through `resolver` instead of the system resolver.
    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.validator =
            Self::validator_for(UrlSafetyValidator::with_resolver(resolver), &self.config);
        self
    }

    /// Replace the validator entirely. Its policy and timeout are kept as given.
    pub fn with_validator(mut self, validator: UrlSafetyValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Issue requests through `client` instead of reqwest.
    pub fn with_client(self, client: impl PageClient + 'static) -> Self {
        self.with_shared_client(Arc::new(client))
    }

    pub fn with_shared_client(mut self, client: Arc<dyn PageClient>) -> Self {
        self.client = client;
        self
    }

    pub fn config(&self) -> &LoadWebPageConfig {
        &self.config
    }

    pub fn validator(&self) -> &UrlSafetyValidator {
        &self.validator
    }

    /// Validate and fetch `url`, keeping the cause of any failure.
    ///
    /// At most one request is sent, and none when validation fails.
    pub async fn fetch(&self, url: &str) -> LoadOutcome {
        let validated = match self.validator.validate(url).await {
            Ok(validated) => validated,
            Err(e) => return LoadOutcome::Blocked(e),
        };

        let request = FetchRequest::new(validated, self.config.timeout());
        tracing::debug!(url, timeout = ?request.timeout, "Fetching page");

        let response = match self.client.get(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url, error = %e, "Fetch failed");
                return LoadOutcome::TransportError(e);
            }
        };

        if !response.is_ok() {
            tracing::debug!(url, status = response.status, "Non-200 response");
            return LoadOutcome::HttpError(response.status);
        }

        let html = decode_body(&response.body, response.content_type.as_deref());
        LoadOutcome::Page(html_to_text(&html))
    }

    /// Load `url` and return its filtered text, or a failure message.
    ///
    /// Never fails. A refused URL yields [`RESTRICTED_MESSAGE`]; a transport
    /// failure yields `"Failed to fetch url: {url}"`. Page text, and the same
    /// failure message for a non-200 status, go through the short-line filter.
    pub async fn load(&self, url: &str) -> String {
        let outcome = self.fetch(url).await;
        tracing::debug!(url, outcome = outcome.kind(), "Page load finished");

        let max_words = self.config.short_line_max_words;
        match outcome {
            LoadOutcome::Blocked(_) => RESTRICTED_MESSAGE.to_string(),
            LoadOutcome::TransportError(_) => fetch_failed_message(url),
            LoadOutcome::HttpError(_) => {
                filter_short_lines(&fetch_failed_message(url), max_words)
            }
            LoadOutcome::Page(text) => filter_short_lines(&text, max_words),
        }
    }
}

impl Default for WebPageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WebPageLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebPageLoader")
            .field("validator", &self.validator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Load a web page with default settings.
///
/// Returns the page's visible text with short lines removed, or one of
/// `"Failed to fetch url: The url is restricted."` and
/// `"Failed to fetch url: {url}"`.
pub async fn load_web_page(url: &str) -> String {
    WebPageLoader::new().load(url).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use webload_ssrf::{AddressPolicy, StaticResolver};

    use crate::client::{FetchError, FetchResponse};

    struct FixedClient {
        status: u16,
        body: &'static str,
        requests: Mutex<Vec<FetchRequest>>,
    }

    impl FixedClient {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageClient for Arc<FixedClient> {
        async fn get(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(FetchResponse {
                status: self.status,
                content_type: Some("text/html".to_string()),
                body: Bytes::from_static(self.body.as_bytes()),
            })
        }
    }

    fn resolver() -> StaticResolver {
        StaticResolver::new()
            .with_host("example.com", ["93.184.216.34".parse::<IpAddr>().unwrap()])
            .with_host("shared.example", ["100.64.0.1".parse::<IpAddr>().unwrap()])
    }

    #[tokio::test]
    async fn test_config_flows_into_request_and_filter() {
        let config = LoadWebPageConfig {
            timeout_secs: 4,
            short_line_max_words: 1,
            ..LoadWebPageConfig::default()
        };
        let client = Arc::new(FixedClient::new(200, "<p>two words</p><p>single</p>"));
        let loader = WebPageLoader::from_config(config)
            .unwrap()
            .with_resolver(resolver())
            .with_client(client.clone());

        assert_eq!(loader.load("https://example.com/").await, "two words");

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].timeout, Duration::from_secs(4));
        assert!(!requests[0].allow_redirects());
    }

    #[tokio::test]
    async fn test_strict_policy_from_config() {
        let client = Arc::new(FixedClient::new(200, "<p>shared address space page text</p>"));

        let standard = WebPageLoader::new()
            .with_resolver(resolver())
            .with_client(client.clone());
        assert_eq!(
            standard.load("http://shared.example/").await,
            "shared address space page text"
        );

        let config = LoadWebPageConfig {
            address_policy: AddressPolicy::Strict,
            ..LoadWebPageConfig::default()
        };
        let strict = WebPageLoader::from_config(config)
            .unwrap()
            .with_resolver(resolver())
            .with_client(client.clone());
        assert_eq!(strict.validator().address_policy(), AddressPolicy::Strict);
        assert_eq!(strict.load("http://shared.example/").await, RESTRICTED_MESSAGE);

        assert_eq!(client.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_reports_status() {
        let client = Arc::new(FixedClient::new(503, ""));
        let loader = WebPageLoader::new()
            .with_resolver(resolver())
            .with_client(client);

        assert!(matches!(
            loader.fetch("https://example.com/").await,
            LoadOutcome::HttpError(503)
        ));
    }

    #[test]
    fn test_from_config_rejects_zero_timeouts() {
        let zero_request = LoadWebPageConfig {
            timeout_secs: 0,
            ..LoadWebPageConfig::default()
        };
        assert!(matches!(
            WebPageLoader::from_config(zero_request),
            Err(ConfigError::Invalid(_))
        ));

        let zero_dns = LoadWebPageConfig {
            dns_timeout_secs: 0,
            ..LoadWebPageConfig::default()
        };
        assert!(matches!(
            WebPageLoader::from_config(zero_dns),
            Err(ConfigError::Invalid(_))
        ));

        assert!(WebPageLoader::from_config(LoadWebPageConfig::default()).is_ok());
    }
}
