//! Wizard configuration parsed from environment variables.

use crate::steps::{DEFAULT_PASSWORD_MIN_LENGTH, Flow, FlowKind};

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_AUTH_TOKEN_ENV: &str = "CAREWIZARD_AUTH_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid API base URL: {0:?} (expected http:// or https://)")]
    InvalidBaseUrl(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    /// Backend origin without a trailing slash.
    pub api_base_url: String,
    pub timeouts: ApiTimeouts,
    pub password_min_length: usize,
    /// Names the env var that holds the bearer token, if any.
    pub auth_token_env: String,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            timeouts: ApiTimeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            password_min_length: DEFAULT_PASSWORD_MIN_LENGTH,
            auth_token_env: DEFAULT_AUTH_TOKEN_ENV.to_owned(),
        }
    }
}

impl WizardConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `CAREWIZARD_API_BASE_URL`: default `http://127.0.0.1:5000`
    /// - `CAREWIZARD_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CAREWIZARD_CONNECT_TIMEOUT_SECS`: default 10
    /// - `CAREWIZARD_PASSWORD_MIN_LENGTH`: default 8
    /// - `CAREWIZARD_AUTH_TOKEN_ENV`: default `CAREWIZARD_AUTH_TOKEN`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let api_base_url = match lookup("CAREWIZARD_API_BASE_URL") {
            Some(raw) => normalize_base_url(&raw)?,
            None => defaults.api_base_url,
        };
        let timeouts = ApiTimeouts {
            request_secs: parse_positive(&lookup, "CAREWIZARD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_positive(&lookup, "CAREWIZARD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let password_min_length =
            parse_positive(&lookup, "CAREWIZARD_PASSWORD_MIN_LENGTH", DEFAULT_PASSWORD_MIN_LENGTH)?;
        let auth_token_env = lookup("CAREWIZARD_AUTH_TOKEN_ENV")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.auth_token_env);

        Ok(Self { api_base_url, timeouts, password_min_length, auth_token_env })
    }

    /// Replace the base URL, e.g. from a command-line override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] for non-HTTP URLs.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_base_url = normalize_base_url(raw)?;
        Ok(self)
    }

    /// Flow of `kind` with this config's rule settings applied.
    #[must_use]
    pub fn flow(&self, kind: FlowKind) -> Flow {
        Flow::new(kind).with_password_min_length(self.password_min_length)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let parsed = raw.trim().parse::<T>();
    match parsed {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err(ConfigError::InvalidValue { key, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
