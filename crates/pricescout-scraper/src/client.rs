use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::error::ScraperError;

/// Builds a `reqwest::Client` with the shared timeout and `User-Agent` policy.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if the client cannot be constructed.
pub(crate) fn build_http_client(
    timeout_secs: u64,
    user_agent: &str,
) -> Result<Client, ScraperError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Parses `base_url` and normalises it to end with exactly one slash so that
/// `Url::join` appends to the configured path instead of replacing it.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, ScraperError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| ScraperError::InvalidBaseUrl {
        base_url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

/// Joins a relative endpoint path onto a normalised base URL.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, ScraperError> {
    base.join(path).map_err(|e| ScraperError::InvalidBaseUrl {
        base_url: base.to_string(),
        reason: e.to_string(),
    })
}

/// Sends a prepared request and decodes a JSON body of type `T`.
///
/// Status mapping:
/// - 401/403 -> [`ScraperError::Auth`]
/// - any other non-2xx -> [`ScraperError::UnexpectedStatus`]
/// - a client-side timeout -> [`ScraperError::Timeout`]
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    url: &Url,
    timeout_secs: u64,
    context: &str,
) -> Result<T, ScraperError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ScraperError::Timeout {
                url: redact_query(url),
                secs: timeout_secs,
            }
        } else {
            ScraperError::Http(e)
        }
    })?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ScraperError::Auth {
            status: status.as_u16(),
            url: redact_query(url),
        });
    }
    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: redact_query(url),
        });
    }

    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            ScraperError::Timeout {
                url: redact_query(url),
                secs: timeout_secs,
            }
        } else {
            ScraperError::Http(e)
        }
    })?;

    serde_json::from_str(&body).map_err(|e| ScraperError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

/// Strips the query string so warnings never echo search terms or tokens.
fn redact_query(url: &Url) -> String {
    let mut bare = url.clone();
    bare.set_query(None);
    bare.to_string()
}
