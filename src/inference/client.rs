//! LM Studio inference client.
//!
//! Sends one non-streaming chat completion per journal entry and hands back
//! the model's markdown untouched. Also answers the reachability question
//! used by the availability prober.

use std::time::Duration;

use reqwest::Client as HttpClient;
use tracing::Instrument;
use uuid::Uuid;

use super::config::ServerConfig;
use super::errors::InferenceError;
use super::types::{CompletionRequest, CompletionResponse};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Upper bound on a single reachability check. Must stay below the prober
/// interval.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// ─── InferenceClient ─────────────────────────────────────────────────────────

/// Client for the local LM Studio endpoint.
///
/// Cheap to clone: clones share the underlying connection pool. No locking
/// is involved, so concurrent `format_entry` calls are independent, each
/// with its own timeout.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: HttpClient,
    config: ServerConfig,
    probe_timeout: Duration,
}

impl InferenceClient {
    /// Create a client for the given endpoint.
    ///
    /// Validates the config. Does NOT check connectivity; use [`probe`] for
    /// that.
    ///
    /// [`probe`]: InferenceClient::probe
    pub fn new(config: ServerConfig) -> Result<Self, InferenceError> {
        config.validate()?;

        // No client-level timeout: the per-call timeout in `format_entry` is
        // the only cancellation trigger.
        let http = HttpClient::builder()
            .build()
            .map_err(|e| InferenceError::Config {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            config,
            probe_timeout: PROBE_TIMEOUT,
        })
    }

    /// Override the reachability check limit (default [`PROBE_TIMEOUT`]).
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    // ─── Formatting ──────────────────────────────────────────────────────

    /// Reformat a raw journal entry into the fixed markdown structure.
    ///
    /// Fails with `EmptyInput` without touching the network when the text is
    /// blank. Otherwise the whole exchange runs under the configured timeout;
    /// when it expires the request future is dropped, which aborts the
    /// connection, and `Timeout` is returned.
    pub async fn format_entry(&self, raw_text: &str) -> Result<String, InferenceError> {
        if raw_text.trim().is_empty() {
            return Err(InferenceError::EmptyInput);
        }

        let request = CompletionRequest::journal_entry(raw_text, self.config.model_name());
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("format_entry", %request_id);

        async {
            match tokio::time::timeout(self.config.timeout(), self.send_completion(&request))
                .await
            {
                Ok(result) => result,
                Err(_elapsed) => {
                    tracing::warn!(
                        timeout_ms = self.config.timeout_ms,
                        "completion request timed out, aborted"
                    );
                    Err(InferenceError::Timeout {
                        timeout_ms: self.config.timeout_ms,
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Single POST / status check / parse round trip. No timeout of its own.
    async fn send_completion(&self, request: &CompletionRequest) -> Result<String, InferenceError> {
        let url = self.config.chat_completions_url();

        tracing::info!(
            url = %url,
            model = request.model().unwrap_or("<loaded>"),
            message_count = request.messages().len(),
            max_tokens = request.max_tokens(),
            "=== LM STUDIO REQUEST ==="
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(body) = serde_json::to_string_pretty(request) {
                tracing::debug!(body = %body, "request body");
            }
        }

        // `.json()` sets `Content-Type: application/json`.
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| InferenceError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        tracing::info!(status = status.as_u16(), "LM Studio response status");

        if !status.is_success() {
            // An unreadable error body is a transport fault, not an endpoint answer.
            let body = response.text().await.map_err(|e| InferenceError::RequestFailed {
                reason: format!("failed to read error body: {e}"),
            })?;
            tracing::warn!(status = status.as_u16(), body = %body, "LM Studio error response");
            return Err(InferenceError::Endpoint {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| InferenceError::RequestFailed {
            reason: format!("failed to read response body: {e}"),
        })?;
        tracing::debug!(body = %body, "response body");

        parse_completion_body(&body)
    }

    // ─── Health Check ────────────────────────────────────────────────────

    /// Check whether the endpoint is reachable and serving the models API.
    ///
    /// Sends `GET /v1/models` with no custom headers. Never fails: any
    /// non-2xx status, transport fault, or a server silent for longer than
    /// the probe timeout is reported as `false`.
    pub async fn probe(&self) -> bool {
        let url = self.config.models_url();

        match self.http.get(&url).timeout(self.probe_timeout).send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                tracing::debug!(url = %url, status = resp.status().as_u16(), ok, "probe finished");
                ok
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "LM Studio connection check failed");
                false
            }
        }
    }
}

/// Parse a 2xx completion body into the first choice's content.
///
/// Malformed JSON is a transport-level fault; a well-formed body with no
/// choice (or a choice without content) is an empty response.
pub fn parse_completion_body(body: &str) -> Result<String, InferenceError> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| InferenceError::RequestFailed {
            reason: format!("failed to parse completion response: {e}"),
        })?;

    response.into_content().ok_or(InferenceError::EmptyResponse)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
