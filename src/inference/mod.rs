//! Inference: LM Studio client for journal formatting.
//!
//! This module handles all communication with the local model endpoint:
//! - Building the fixed formatting request (system instruction + entry)
//! - Non-streaming chat completions with a single per-call timeout
//! - Typed failure reporting (`InferenceError`)
//! - Reachability probing and the periodic availability prober
//! - Endpoint configuration loading from `journal-formatter.yaml`
//!
//! The client speaks the OpenAI Chat Completions API, so any compatible
//! local server works; LM Studio is the reference deployment.

pub mod client;
pub mod config;
pub mod errors;
pub mod prober;
pub mod prompt;
pub mod types;

// Re-exports for convenience
pub use client::{InferenceClient, PROBE_TIMEOUT};
pub use config::{AppConfig, ServerConfig};
pub use errors::InferenceError;
pub use prober::{AvailabilityProber, ConnectivityState, Probe, ProberHandle, PROBE_INTERVAL};
pub use types::{ChatMessage, CompletionRequest, CompletionResponse, Role};
