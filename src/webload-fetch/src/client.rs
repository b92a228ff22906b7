//! HTTP transport.
//!
//! The loader talks to the network through [`PageClient`], one GET per call.
//! [`ReqwestPageClient`] is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use url::Url;

use crate::config::{LoadWebPageConfig, USER_AGENT};

/// Transport failures. Any of these is reported to the caller as a fetch
/// failure for the requested URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("response too large: {size} bytes exceeds limit of {limit} bytes")]
    ResponseTooLarge { size: u64, limit: usize },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// A single GET to issue.
///
/// Redirects are never followed: a redirect target has not been through
/// URL validation. `allow_redirects` records that and cannot be changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: Url,
    pub timeout: Duration,
    allow_redirects: bool,
}

impl FetchRequest {
    /// A GET that does not follow redirects.
    pub fn new(url: Url, timeout: Duration) -> Self {
        Self {
            url,
            timeout,
            allow_redirects: false,
        }
    }

    pub fn allow_redirects(&self) -> bool {
        self.allow_redirects
    }
}

/// Status, content type and raw body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Issues HTTP GET requests.
#[async_trait]
pub trait PageClient: Send + Sync {
    async fn get(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// [`PageClient`] backed by `reqwest`.
///
/// A client is built for every request so timeouts always come from the
/// request itself. Redirect responses are returned as they are.
#[derive(Debug, Clone)]
pub struct ReqwestPageClient {
    user_agent: String,
    connect_timeout: Option<Duration>,
    max_response_bytes: Option<usize>,
}

impl Default for ReqwestPageClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestPageClient {
    pub fn new() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            connect_timeout: None,
            max_response_bytes: None,
        }
    }

    pub fn from_config(config: &LoadWebPageConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            connect_timeout: config.connect_timeout(),
            max_response_bytes: config.max_response_bytes,
        }
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = Some(limit);
        self
    }

    fn build_client(&self, request: &FetchRequest) -> Result<reqwest::Client, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::none())
            .timeout(request.timeout)
            .tcp_nodelay(true);

        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        builder
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))
    }

    fn map_error(request: &FetchRequest, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(request.timeout)
        } else {
            FetchError::Transport(error.to_string())
        }
    }

    fn check_size(&self, size: u64) -> Result<(), FetchError> {
        match self.max_response_bytes {
            Some(limit) if size > limit as u64 => Err(FetchError::ResponseTooLarge { size, limit }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PageClient for ReqwestPageClient {
    async fn get(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let client = self.build_client(request)?;

        let mut response = client
            .get(request.url.clone())
            .send()
            .await
            .map_err(|e| Self::map_error(request, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(content_length) = response.content_length() {
            self.check_size(content_length)?;
        }

        // Read chunk by chunk so an oversized body without Content-Length is
        // cut off as soon as it crosses the limit.
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Self::map_error(request, e))?
        {
            body.extend_from_slice(&chunk);
            self.check_size(body.len() as u64)?;
        }

        tracing::debug!(
            url = %request.url,
            status,
            bytes = body.len(),
            "Fetched page"
        );

        Ok(FetchResponse {
            status,
            content_type,
            body: Bytes::from(body),
        })
    }
}
