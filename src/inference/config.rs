//! Endpoint configuration loading and validation.
//!
//! The inference client only ever sees a built [`ServerConfig`]. Finding and
//! reading `journal-formatter.yaml` (and resolving environment variables in
//! it) happens here, outside the client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use super::errors::InferenceError;

/// File name searched for when walking up from the working directory.
pub const CONFIG_FILE_NAME: &str = "journal-formatter.yaml";

/// Env var that points directly at a config file.
pub const CONFIG_ENV_VAR: &str = "JOURNAL_FORMATTER_CONFIG";

/// Server address used when no config file exists.
pub const DEFAULT_BASE_URL: &str = "http://localhost:1234";

/// Request timeout used when the config does not set one.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

// ─── Public Types ────────────────────────────────────────────────────────────

/// Connection settings for the local inference server.
///
/// Immutable once handed to the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    /// Exact model name, or empty/absent to use whatever the server has loaded.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ServerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// The model to request by name. `None` when absent or empty.
    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().filter(|m| !m.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `{base_url}/v1/chat/completions`
    pub fn chat_completions_url(&self) -> String {
        self.endpoint("/v1/chat/completions")
    }

    /// `{base_url}/v1/models`
    pub fn models_url(&self) -> String {
        self.endpoint("/v1/models")
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Check that the base URL is an absolute http(s) URL and the timeout is
    /// non-zero.
    pub fn validate(&self) -> Result<(), InferenceError> {
        let url = Url::parse(&self.base_url).map_err(|e| InferenceError::Config {
            reason: format!("invalid base_url '{}': {e}", self.base_url),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(InferenceError::Config {
                reason: format!(
                    "base_url '{}' must use http or https, got '{}'",
                    self.base_url,
                    url.scheme()
                ),
            });
        }

        if self.timeout_ms == 0 {
            return Err(InferenceError::Config {
                reason: "timeout_ms must be greater than zero".into(),
            });
        }

        Ok(())
    }
}

/// Top-level config file (mirrors `journal-formatter.yaml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub lm_studio: ServerConfig,
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Locate the config file.
///
/// Resolution order:
/// 1. `JOURNAL_FORMATTER_CONFIG`, if it names an existing file.
/// 2. `journal-formatter.yaml` in `start` or any of its ancestors.
/// 3. `<config dir>/journal-formatter/config.yaml`.
pub fn find_config_path(start: &Path) -> Result<PathBuf, InferenceError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(expand_tilde(&path));
        if candidate.is_file() {
            return Ok(candidate);
        }
        tracing::warn!(
            path = %candidate.display(),
            "{CONFIG_ENV_VAR} does not point at a file, ignoring"
        );
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let candidate = config_dir.join("journal-formatter").join("config.yaml");
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(InferenceError::Config {
        reason: format!("could not find {CONFIG_FILE_NAME}"),
    })
}

/// Load, interpolate, parse and validate a config file.
///
/// String values may reference `${VAR_NAME}` or `${VAR_NAME:-default}`.
pub fn load_config(path: &Path) -> Result<AppConfig, InferenceError> {
    let raw = std::fs::read_to_string(path).map_err(|e| InferenceError::Config {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;

    let config = parse_config(&raw)?;
    tracing::debug!(
        path = %path.display(),
        base_url = %config.lm_studio.base_url,
        "loaded config"
    );
    Ok(config)
}

/// Parse config text. Blank input yields the defaults.
pub fn parse_config(raw: &str) -> Result<AppConfig, InferenceError> {
    let interpolated = interpolate_env_vars(raw);

    let config: AppConfig = if interpolated.trim().is_empty() {
        AppConfig::default()
    } else {
        serde_yaml::from_str(&interpolated).map_err(|e| InferenceError::Config {
            reason: format!("failed to parse config: {e}"),
        })?
    };

    config.lm_studio.validate()?;
    Ok(config)
}

/// Load the config found from `start`, or fall back to defaults when no
/// file exists. A file that exists but fails to load is still an error.
pub fn load_or_default(start: &Path) -> Result<AppConfig, InferenceError> {
    match find_config_path(start) {
        Ok(path) => load_config(&path),
        Err(_) => {
            tracing::info!(base_url = DEFAULT_BASE_URL, "no config file found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Substitute `${NAME}` and `${NAME:-fallback}` references.
///
/// Unset variables without a fallback become empty. An opening `${` with no
/// closing brace is kept as literal text.
fn interpolate_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find("${") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find('}') else {
            rest = &rest[open..];
            break;
        };
        out.push_str(&lookup_var(&after[..close]));
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

/// `NAME` or `NAME:-fallback`. Fallbacks get `~` expansion, values from the
/// environment are used as-is.
fn lookup_var(expr: &str) -> String {
    let (name, fallback) = match expr.split_once(":-") {
        Some((name, fallback)) => (name, Some(fallback)),
        None => (expr, None),
    };

    match std::env::var(name.trim()) {
        Ok(value) => value,
        Err(_) => fallback.map(expand_tilde).unwrap_or_default(),
    }
}

/// `~` or `~/...` relative to the home directory. `~user` forms are left alone.
fn expand_tilde(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return path.to_string(),
    };
    match dirs::home_dir() {
        Some(home) => format!("{}{rest}", home.display()),
        None => path.to_string(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
