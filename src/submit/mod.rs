//! Submission adapter: maps a finished form to the backend payload and sends it.
//!
//! ARCHITECTURE
//! ============
//! `payload` turns a `FormState` into a [`SubmitRequest`] without side
//! effects. A [`Submitter`] delivers the request; [`HttpSubmitter`] is the
//! real implementation, tests plug in in-memory doubles.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is recoverable. The wizard keeps the user on the final step
//! and shows [`SubmissionError::user_message`] as a banner.


mod http;
mod payload;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::steps::FlowKind;

pub use http::{EnvTokenSource, HttpSubmitter, StaticToken, TokenSource};
pub use payload::{build_payload, build_request};

const NETWORK_MESSAGE: &str = "Unable to reach the server. Check your connection and try again.";
const SERVER_MESSAGE: &str = "The server could not complete the request. Please try again.";
const INVALID_RESPONSE_MESSAGE: &str = "Unexpected response from the server. Please try again.";

/// A ready-to-send final submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitRequest {
    pub flow: FlowKind,
    /// Path relative to the API base URL.
    pub path: &'static str,
    pub payload: Value,
}

/// Successful submission result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Confirmation {
    /// Opaque identifier from the response data (`token`, `id`, `_id`, `appointmentId`).
    pub token: Option<String>,
    pub message: Option<String>,
    pub data: Value,
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// The server refused the payload and said why.
    #[error("rejected by server (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Duplicate or conflicting record (HTTP 409).
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    #[error("server error: status {status}")]
    Server { status: u16 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl SubmissionError {
    /// Banner text for the final step. Server-provided messages pass through verbatim.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } | Self::Conflict { message } => message.clone(),
            Self::Network(_) => NETWORK_MESSAGE.to_owned(),
            Self::Server { .. } => SERVER_MESSAGE.to_owned(),
            Self::InvalidResponse(_) => INVALID_RESPONSE_MESSAGE.to_owned(),
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "E_REJECTED",
            Self::Conflict { .. } => "E_CONFLICT",
            Self::Network(_) => "E_NETWORK",
            Self::Server { .. } => "E_SERVER",
            Self::InvalidResponse(_) => "E_INVALID_RESPONSE",
        }
    }

    /// Whether resending the same payload unchanged may succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }
}

// =============================================================================
// SUBMITTER
// =============================================================================

/// Delivers a final submission to the backend.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, request: &SubmitRequest) -> Result<Confirmation, SubmissionError>;
}
