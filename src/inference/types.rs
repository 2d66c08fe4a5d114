//! Shared types for the inference client.
//!
//! These mirror the subset of the OpenAI Chat Completions API that LM Studio
//! speaks, used for both request building and response parsing.

use serde::{Deserialize, Serialize};

use super::prompt;

/// Sampling temperature sent with every formatting request.
pub const TEMPERATURE: f32 = 0.7;

/// Upper bound on generated tokens per formatting request.
pub const MAX_TOKENS: u32 = 1000;

// ─── Request Types ───────────────────────────────────────────────────────────

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request body for `POST /v1/chat/completions`.
///
/// `model` is omitted from the wire entirely when `None`, which tells the
/// server to use whichever model it currently has loaded. An empty string
/// would instead be sent as a model name, so it is never stored here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

impl CompletionRequest {
    /// Build the formatting request for one journal entry.
    ///
    /// The system instruction comes first, followed by the user text behind
    /// the fixed prefix. `model` is kept only when it is a non-empty string.
    pub fn journal_entry(raw_text: &str, model: Option<&str>) -> Self {
        Self {
            model: model.filter(|m| !m.is_empty()).map(str::to_string),
            messages: vec![
                ChatMessage::system(prompt::SYSTEM_PROMPT),
                ChatMessage::user(prompt::user_message(raw_text)),
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream: false,
        }
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn stream(&self) -> bool {
        self.stream
    }
}

// ─── Response Types ──────────────────────────────────────────────────────────

/// Response body of a non-streaming chat completion.
///
/// Only `choices[0].message.content` is consumed; everything else the server
/// sends (usage, ids, finish reasons) is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// A single completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

/// The assistant message inside a choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Content of the first choice, untouched.
    pub fn into_content(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
