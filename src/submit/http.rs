//! HTTP submitter backed by `reqwest`.
//!
//! The backend answers with `{ success, data?, message? }`. Status codes and
//! the `success` flag are mapped onto [`SubmissionError`] variants here so the
//! wizard only ever sees typed outcomes.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Confirmation, SubmissionError, SubmitRequest, Submitter};
use crate::config::{ConfigError, WizardConfig};

const DEFAULT_REJECTED_MESSAGE: &str = "The submission was rejected.";
const DEFAULT_CONFLICT_MESSAGE: &str = "This record already exists.";
const TOKEN_KEYS: &[&str] = &["token", "id", "_id", "appointmentId"];

// =============================================================================
// AUTH TOKEN SOURCE
// =============================================================================

/// Read access to an auth token owned by some outside store.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Reads the token from a named environment variable on every request.
#[derive(Debug, Clone)]
pub struct EnvTokenSource {
    var: String,
}

impl EnvTokenSource {
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenSource for EnvTokenSource {
    fn token(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpSubmitter {
    http: reqwest::Client,
    base_url: String,
    tokens: Option<Box<dyn TokenSource>>,
}

impl HttpSubmitter {
    /// Build a client using the configured base URL and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClientBuild`] if the TLS backend cannot be initialized.
    pub fn new(config: &WizardConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ConfigError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_base_url.clone(), tokens: None })
    }

    #[must_use]
    pub fn with_token_source(mut self, tokens: Box<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Submitter for HttpSubmitter {
    async fn submit(&self, request: &SubmitRequest) -> Result<Confirmation, SubmissionError> {
        let url = self.url(request.path);
        let mut builder = self.http.post(&url).json(&request.payload);
        if let Some(token) = self.tokens.as_ref().and_then(|t| t.token()) {
            builder = builder.bearer_auth(token);
        }

        debug!(%url, flow = ?request.flow, "submit: sending");
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, %url, "submit: request failed");
            SubmissionError::Network(e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;
        debug!(status, body_len = body.len(), "submit: response received");
        parse_response(status, &body)
    }
}

// =============================================================================
// RESPONSE MAPPING
// =============================================================================

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default, alias = "error")]
    message: Option<String>,
}

pub(crate) fn parse_response(status: u16, body: &str) -> Result<Confirmation, SubmissionError> {
    let envelope = serde_json::from_str::<ApiEnvelope>(body).ok();
    let message = envelope
        .as_ref()
        .and_then(|e| e.message.clone())
        .filter(|m| !m.trim().is_empty());

    match status {
        409 => {
            return Err(SubmissionError::Conflict {
                message: message.unwrap_or_else(|| DEFAULT_CONFLICT_MESSAGE.to_owned()),
            });
        }
        400..=499 => {
            return Err(SubmissionError::Rejected {
                status,
                message: message.unwrap_or_else(|| format!("request failed: {status}")),
            });
        }
        500..=599 => return Err(SubmissionError::Server { status }),
        200..=299 => {}
        other => return Err(SubmissionError::InvalidResponse(format!("unexpected status {other}"))),
    }

    let Some(envelope) = envelope else {
        return Err(SubmissionError::InvalidResponse("response body is not a JSON envelope".to_owned()));
    };
    if !envelope.success {
        return Err(SubmissionError::Rejected {
            status,
            message: message.unwrap_or_else(|| DEFAULT_REJECTED_MESSAGE.to_owned()),
        });
    }

    let data = envelope.data.unwrap_or(Value::Null);
    Ok(Confirmation { token: extract_token(&data), message, data })
}

fn extract_token(data: &Value) -> Option<String> {
    TOKEN_KEYS.iter().find_map(|key| match data.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
