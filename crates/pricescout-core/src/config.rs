use crate::app_config::{AppConfig, MlOAuthConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// No variable is required. Missing API keys leave the matching source
/// unconfigured; the search reports that as a per-source warning instead of
/// refusing to start.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    // Blank values count as unset so `FOO=` in a .env file disables FOO.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "timeout must be at least 1 second".to_string(),
            });
        }
        Ok(value)
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match optional(var) {
            None => Ok(default),
            Some(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected true/false, got \"{raw}\""),
            }),
        }
    };

    let log_level = or_default("PRICESCOUT_LOG_LEVEL", "warn");
    let user_agent = or_default("PRICESCOUT_USER_AGENT", "pricescout/0.1 (shopping-agent)");
    let rapidapi_key = optional("RAPIDAPI_KEY");
    let anthropic_api_key = optional("ANTHROPIC_API_KEY");
    let relevance_model = or_default("PRICESCOUT_RELEVANCE_MODEL", "claude-haiku-4-5-20251001");

    let ml_oauth = build_ml_oauth(
        optional("ML_APP_ID"),
        optional("ML_APP_SECRET"),
        optional("ML_REFRESH_TOKEN"),
        PathBuf::from(or_default(
            "PRICESCOUT_TOKEN_PATH",
            "./.pricescout/ml-token.json",
        )),
    )?;

    let api_timeout_secs = parse_u64("PRICESCOUT_API_TIMEOUT_SECS", "20")?;
    let browser_enabled = parse_bool("PRICESCOUT_BROWSER_ENABLED", true)?;
    let browser_timeout_secs = parse_u64("PRICESCOUT_BROWSER_TIMEOUT_SECS", "30")?;
    let chrome_path = optional("PRICESCOUT_CHROME_PATH").map(PathBuf::from);
    let relevance_timeout_secs = parse_u64("PRICESCOUT_RELEVANCE_TIMEOUT_SECS", "15")?;

    Ok(AppConfig {
        log_level,
        user_agent,
        rapidapi_key,
        ml_oauth,
        anthropic_api_key,
        relevance_model,
        api_timeout_secs,
        browser_enabled,
        browser_timeout_secs,
        chrome_path,
        relevance_timeout_secs,
    })
}

/// The OAuth backend is all-or-nothing: a partial credential set is a
/// configuration mistake worth failing loudly on.
fn build_ml_oauth(
    app_id: Option<String>,
    app_secret: Option<String>,
    refresh_token: Option<String>,
    token_path: std::path::PathBuf,
) -> Result<Option<MlOAuthConfig>, ConfigError> {
    match (app_id, app_secret, refresh_token) {
        (None, None, None) => Ok(None),
        (Some(app_id), Some(app_secret), Some(refresh_token)) => Ok(Some(MlOAuthConfig {
            app_id,
            app_secret,
            refresh_token,
            token_path,
        })),
        (app_id, app_secret, _) => {
            let missing = if app_id.is_none() {
                "ML_APP_ID"
            } else if app_secret.is_none() {
                "ML_APP_SECRET"
            } else {
                "ML_REFRESH_TOKEN"
            };
            Err(ConfigError::MissingEnvVar(missing.to_string()))
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
