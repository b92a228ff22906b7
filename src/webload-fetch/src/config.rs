//! Loader configuration.
//!
//! All keys are optional; missing keys take the defaults below. Example
//! `webload.toml`:
//!
//! ```toml
//! timeout_secs = 10
//! dns_timeout_secs = 5
//! short_line_max_words = 3
//! max_response_bytes = 10485760
//! address_policy = "strict"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use webload_ssrf::{AddressPolicy, DEFAULT_DNS_TIMEOUT_SECS};

/// Default request timeout (10 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Lines with this many words or fewer are dropped from page text.
pub const DEFAULT_SHORT_LINE_MAX_WORDS: usize = 3;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("webload/", env!("CARGO_PKG_VERSION"));

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for [`crate::WebPageLoader`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadWebPageConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,

    /// Optional connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,

    /// Bound on host name resolution during validation, in seconds.
    pub dns_timeout_secs: u64,

    /// Lines with at most this many whitespace-separated words are dropped.
    pub short_line_max_words: usize,

    /// Optional cap on the response body size. Larger bodies are a fetch failure.
    pub max_response_bytes: Option<usize>,

    /// User-Agent header value.
    pub user_agent: String,

    /// Which address classes the validator refuses.
    pub address_policy: AddressPolicy,
}

impl Default for LoadWebPageConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: None,
            dns_timeout_secs: DEFAULT_DNS_TIMEOUT_SECS,
            short_line_max_words: DEFAULT_SHORT_LINE_MAX_WORDS,
            max_response_bytes: None,
            user_agent: USER_AGENT.to_string(),
            address_policy: AddressPolicy::default(),
        }
    }
}

impl LoadWebPageConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject values that would disable a bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.dns_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "dns_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }
}
