use std::path::PathBuf;

/// Credentials for the official Mercado Livre API (OAuth refresh flow).
#[derive(Clone)]
pub struct MlOAuthConfig {
    pub app_id: String,
    pub app_secret: String,
    pub refresh_token: String,
    pub token_path: PathBuf,
}

impl std::fmt::Debug for MlOAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MlOAuthConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("token_path", &self.token_path)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub user_agent: String,
    pub rapidapi_key: Option<String>,
    pub ml_oauth: Option<MlOAuthConfig>,
    pub anthropic_api_key: Option<String>,
    pub relevance_model: String,
    pub api_timeout_secs: u64,
    pub browser_enabled: bool,
    pub browser_timeout_secs: u64,
    pub chrome_path: Option<PathBuf>,
    pub relevance_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("user_agent", &self.user_agent)
            .field(
                "rapidapi_key",
                &self.rapidapi_key.as_ref().map(|_| "[redacted]"),
            )
            .field("ml_oauth", &self.ml_oauth)
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("relevance_model", &self.relevance_model)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("browser_enabled", &self.browser_enabled)
            .field("browser_timeout_secs", &self.browser_timeout_secs)
            .field("chrome_path", &self.chrome_path)
            .field("relevance_timeout_secs", &self.relevance_timeout_secs)
            .finish()
    }
}
