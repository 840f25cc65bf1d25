//! Configuration types.
//!
//! Everything is environment-driven with sensible defaults, so the binary
//! starts with nothing but (optionally) a cloud API key exported.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Inference routing and provider configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of the local Ollama-compatible server.
    pub local_base_url: String,
    /// Model served by the local provider.
    pub local_model: String,
    /// API key for the OpenAI-compatible cloud endpoint (may be empty).
    pub cloud_api_key: SecretString,
    /// Base URL of the cloud endpoint.
    pub cloud_base_url: String,
    /// Default cloud model.
    pub cloud_model: String,
    /// Specialized cloud models, selected by task hint.
    pub model_reasoning: String,
    pub model_coding: String,
    pub model_long_context: String,
    pub model_creative: String,
    pub model_budget: String,
    /// Prompts over this approximate token count route to the cloud.
    pub local_token_threshold: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            local_base_url: "http://localhost:11434".to_string(),
            local_model: "llama3:8b".to_string(),
            cloud_api_key: SecretString::from(""),
            cloud_base_url: "https://openrouter.ai/api/v1".to_string(),
            cloud_model: "anthropic/claude-3.5-sonnet".to_string(),
            model_reasoning: "anthropic/claude-3-opus".to_string(),
            model_coding: "anthropic/claude-3.5-sonnet".to_string(),
            model_long_context: "google/gemini-pro-1.5".to_string(),
            model_creative: "anthropic/claude-3.5-sonnet".to_string(),
            model_budget: "deepseek/deepseek-chat".to_string(),
            local_token_threshold: 2000,
        }
    }
}

/// Integration credentials. Empty values mean "not configured" — every
/// integration checks `is_configured()` before doing work.
#[derive(Debug, Clone, Default)]
pub struct IntegrationsConfig {
    pub github_token: String,
    pub github_username: String,
    pub notion_api_key: String,
    pub notion_daily_log_db: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
}

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address for the HTTP surface.
    pub bind_addr: String,
    /// Path of the local database file.
    pub db_path: String,
    /// How many recent turns the persona prompt includes.
    pub history_window: usize,
    pub llm: LlmConfig,
    pub integrations: IntegrationsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            db_path: "./data/aide.db".to_string(),
            history_window: 12,
            llm: LlmConfig::default(),
            integrations: IntegrationsConfig::default(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a numeric env var, keeping the default when unset but rejecting a
/// value that is set and garbage.
fn env_parse_or(key: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a number, got '{raw}'"),
        }),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Build a configuration from environment variables, falling back to the
    /// defaults above for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let llm_defaults = LlmConfig::default();

        let local_token_threshold = env_parse_or(
            "AIDE_LOCAL_TOKEN_THRESHOLD",
            llm_defaults.local_token_threshold,
        )?;
        let history_window = env_parse_or("AIDE_HISTORY_WINDOW", defaults.history_window)?;

        Ok(Self {
            bind_addr: env_or("AIDE_BIND_ADDR", &defaults.bind_addr),
            db_path: env_or("AIDE_DB_PATH", &defaults.db_path),
            history_window,
            llm: LlmConfig {
                local_base_url: env_or("AIDE_OLLAMA_URL", &llm_defaults.local_base_url),
                local_model: env_or("AIDE_LOCAL_MODEL", &llm_defaults.local_model),
                cloud_api_key: SecretString::from(env_or("OPENROUTER_API_KEY", "")),
                cloud_base_url: env_or("AIDE_CLOUD_URL", &llm_defaults.cloud_base_url),
                cloud_model: env_or("AIDE_CLOUD_MODEL", &llm_defaults.cloud_model),
                model_reasoning: env_or("AIDE_MODEL_REASONING", &llm_defaults.model_reasoning),
                model_coding: env_or("AIDE_MODEL_CODING", &llm_defaults.model_coding),
                model_long_context: env_or(
                    "AIDE_MODEL_LONG_CONTEXT",
                    &llm_defaults.model_long_context,
                ),
                model_creative: env_or("AIDE_MODEL_CREATIVE", &llm_defaults.model_creative),
                model_budget: env_or("AIDE_MODEL_BUDGET", &llm_defaults.model_budget),
                local_token_threshold,
            },
            integrations: IntegrationsConfig {
                github_token: env_or("GITHUB_TOKEN", ""),
                github_username: env_or("GITHUB_USERNAME", ""),
                notion_api_key: env_or("NOTION_API_KEY", ""),
                notion_daily_log_db: env_or("NOTION_DAILY_LOG_DB", ""),
                telegram_bot_token: env_or("TELEGRAM_BOT_TOKEN", ""),
                telegram_chat_id: env_or("TELEGRAM_CHAT_ID", ""),
            },
        })
    }
}
