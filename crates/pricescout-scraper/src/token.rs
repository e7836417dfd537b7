//! File-backed OAuth token provider for the official Mercado Livre API.
//!
//! The token file is JSON with `access_token`, `refresh_token`, and an
//! RFC 3339 `expires_at`. [`TokenProvider::access_token`] hands out the cached
//! token while it has more than [`REFRESH_MARGIN_SECS`] left, and otherwise
//! runs the `refresh_token` grant, persists the result, and returns the new
//! token. Refreshes are serialized through one async mutex so concurrent
//! callers never race on the file or burn a rotated refresh token twice.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use pricescout_core::MlOAuthConfig;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::client::{build_http_client, endpoint, parse_base_url};
use crate::error::ScraperError;

const DEFAULT_BASE_URL: &str = "https://api.mercadolivre.com.br/";

/// Tokens expiring within this many seconds are refreshed before use.
pub const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("token refresh rejected (HTTP {status}): {body}; re-run the OAuth flow and update ML_REFRESH_TOKEN")]
    Refresh { status: u16, body: String },

    #[error("token refresh response was not understood: {0}")]
    InvalidResponse(#[source] serde_json::Error),

    #[error("token refresh response has unusable expires_in {expires_in}")]
    InvalidExpiry { expires_in: i64 },

    #[error("token refresh request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// On-disk token representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now > TimeDelta::seconds(REFRESH_MARGIN_SECS)
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

/// Scoped provider of a valid bearer token.
pub struct TokenProvider {
    client: Client,
    token_url: Url,
    app_id: String,
    app_secret: String,
    fallback_refresh_token: String,
    path: PathBuf,
    state: Mutex<Option<StoredToken>>,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("token_url", &self.token_url.as_str())
            .field("app_id", &self.app_id)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl TokenProvider {
    /// Creates a provider that refreshes against the production OAuth endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(
        config: &MlOAuthConfig,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        Self::with_base_url(config, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a provider with a custom OAuth base URL (for wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built, or
    /// [`ScraperError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        config: &MlOAuthConfig,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        let client = build_http_client(timeout_secs, user_agent)?;
        let token_url = endpoint(&parse_base_url(base_url)?, "oauth/token")?;
        Ok(Self {
            client,
            token_url,
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            fallback_refresh_token: config.refresh_token.clone(),
            path: config.token_path.clone(),
            state: Mutex::new(None),
        })
    }

    /// Path of the backing token file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a bearer token valid for at least [`REFRESH_MARGIN_SECS`].
    ///
    /// # Errors
    ///
    /// - [`TokenError::Io`] / [`TokenError::Parse`] if the token file exists
    ///   but cannot be read or parsed, or the refreshed token cannot be saved.
    /// - [`TokenError::Refresh`] if the OAuth endpoint rejects the grant.
    /// - [`TokenError::Http`] on network failure.
    pub async fn access_token(&self) -> Result<String, TokenError> {
        let mut state = self.state.lock().await;

        if state.is_none() {
            *state = load_token(&self.path).await?;
        }

        if let Some(token) = state.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let refresh_token = state
            .as_ref()
            .map_or(self.fallback_refresh_token.as_str(), |t| {
                t.refresh_token.as_str()
            })
            .to_owned();

        tracing::debug!(path = %self.path.display(), "refreshing ML access token");
        let refreshed = self.refresh(&refresh_token).await?;
        save_token(&self.path, &refreshed).await?;

        let access_token = refreshed.access_token.clone();
        *state = Some(refreshed);
        Ok(access_token)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<StoredToken, TokenError> {
        let response = self
            .client
            .post(self.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.app_id.as_str()),
                ("client_secret", self.app_secret.as_str()),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TokenError::Refresh {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RefreshResponse =
            serde_json::from_str(&body).map_err(TokenError::InvalidResponse)?;

        let expires_at = TimeDelta::try_seconds(parsed.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or(TokenError::InvalidExpiry {
                expires_in: parsed.expires_in,
            })?;

        Ok(StoredToken {
            access_token: parsed.access_token,
            // ML rotates refresh tokens; keep the old one only if none came back.
            refresh_token: parsed
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_owned()),
            expires_at,
        })
    }
}

async fn load_token(path: &Path) -> Result<Option<StoredToken>, TokenError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(TokenError::Io {
                path: path.to_owned(),
                source: e,
            })
        }
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| TokenError::Parse {
            path: path.to_owned(),
            source: e,
        })
}

/// Writes the token to a sibling temp file, then renames it into place.
async fn save_token(path: &Path, token: &StoredToken) -> Result<(), TokenError> {
    let io_err = |source: std::io::Error| TokenError::Io {
        path: path.to_owned(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let json = serde_json::to_vec_pretty(token).map_err(|e| TokenError::Parse {
        path: path.to_owned(),
        source: e,
    })?;

    let tmp = path.with_extension("json.tmp");
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    {
        use tokio::io::AsyncWriteExt;
        let mut file = options.open(&tmp).await.map_err(io_err)?;
        file.write_all(&json).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
    }

    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}
