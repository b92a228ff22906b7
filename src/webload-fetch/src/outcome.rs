//! Result of a single page load, before it is flattened to a string.

use webload_ssrf::SsrfError;

use crate::client::FetchError;

/// Returned for any URL the validator refuses.
pub const RESTRICTED_MESSAGE: &str = "Failed to fetch url: The url is restricted.";

/// Returned when the page could not be fetched, or came back with a
/// status other than 200.
pub fn fetch_failed_message(url: &str) -> String {
    format!("Failed to fetch url: {url}")
}

/// What happened to a load.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Status 200; visible page text, not yet filtered.
    Page(String),
    /// The validator refused the URL. No request was sent.
    Blocked(SsrfError),
    /// The request failed before a status was received, or the body could
    /// not be read.
    TransportError(FetchError),
    /// The server answered with a status other than 200.
    HttpError(u16),
}

impl LoadOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }

    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Page(_) => "page",
            Self::Blocked(_) => "blocked",
            Self::TransportError(_) => "transport_error",
            Self::HttpError(_) => "http_error",
        }
    }
}
