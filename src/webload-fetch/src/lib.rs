//! SSRF-safe web page loading.
//!
//! [`load_web_page`] validates a URL with [`webload_ssrf`], issues a single
//! GET with redirects disabled, extracts the page's visible text and drops
//! lines of three words or fewer. It never returns an error; failures come
//! back as one of two fixed messages:
//!
//! - `"Failed to fetch url: The url is restricted."` when the URL is refused
//! - `"Failed to fetch url: {url}"` when the request fails or the status is
//!   not 200
//!
//! # Example
//!
//! ```rust,ignore
//! use webload_fetch::{LoadWebPageConfig, WebPageLoader};
//!
//! let config = LoadWebPageConfig::load("webload.toml")?;
//! let loader = WebPageLoader::from_config(config)?;
//! let text = loader.load("https://example.com/").await;
//! ```

pub mod client;
pub mod config;
pub mod extract;
pub mod filter;
pub mod loader;
pub mod outcome;
pub mod tool;

pub use client::{FetchError, FetchRequest, FetchResponse, PageClient, ReqwestPageClient};
pub use config::{ConfigError, LoadWebPageConfig};
pub use extract::{decode_body, html_to_text};
pub use filter::{filter_short_lines, split_lines, word_count};
pub use loader::{WebPageLoader, load_web_page};
pub use outcome::{LoadOutcome, RESTRICTED_MESSAGE, fetch_failed_message};
pub use tool::{LOAD_WEB_PAGE, LoadWebPageTool, ToolDefinition, ToolError, ToolHandler};

pub use webload_ssrf::{AddressPolicy, SsrfError, UrlSafetyValidator, is_safe_url};
