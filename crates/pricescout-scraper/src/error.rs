use thiserror::Error;

use crate::token::TokenError;

/// Why a single adapter produced no listings.
///
/// Every variant renders a human-readable cause; the orchestrator records it
/// as a per-source warning and moves on to the next tier or source.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{var} is not configured; {adapter} skipped")]
    MissingCredentials {
        var: &'static str,
        adapter: &'static str,
    },

    #[error("authentication rejected (HTTP {status}) by {url}; check the API key or refresh token")]
    Auth { status: u16, url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("blocked by {url}: page shows \"{indicator}\" (CAPTCHA or bot check)")]
    Blocked { url: String, indicator: String },

    #[error("expected page structure not found at {url} (selector \"{selector}\")")]
    PageStructure { url: String, selector: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}
