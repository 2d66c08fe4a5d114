//! Inference error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. The client never
//! recovers from these locally: presentation and retry decisions belong to
//! the caller.

use thiserror::Error;

/// Errors that can occur while formatting a journal entry.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The caller passed text that is empty after trimming. Never reaches
    /// the network.
    #[error("no journal text provided")]
    EmptyInput,

    /// The endpoint did not produce a complete response within the
    /// configured timeout. The in-flight request was aborted.
    #[error("request to LM Studio timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The server was reachable but answered with a non-2xx status.
    #[error("LM Studio API error: {status} {status_text} - {body}")]
    Endpoint {
        status: u16,
        status_text: String,
        body: String,
    },

    /// 2xx response without a usable completion choice.
    #[error("no response from LM Studio")]
    EmptyResponse,

    /// Any other transport-level fault: DNS failure, refused connection,
    /// unreadable or malformed response body.
    #[error("request failed: {reason}")]
    RequestFailed { reason: String },

    /// Configuration loading or validation error.
    #[error("config error: {reason}")]
    Config { reason: String },
}

impl InferenceError {
    /// Whether this error is the timeout firing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, InferenceError::Timeout { .. })
    }

    /// HTTP status code, if this is an `Endpoint` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            InferenceError::Endpoint { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Extract the error body text, if this is an `Endpoint` error.
    pub fn error_body(&self) -> Option<&str> {
        match self {
            InferenceError::Endpoint { body, .. } => Some(body),
            _ => None,
        }
    }
}
