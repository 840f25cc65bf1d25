//! Cloud provider — OpenAI-compatible chat-completions endpoint.
//!
//! Model selection is task-hint driven: reasoning, coding, long-context,
//! creative, and budget work each get their configured model; everything
//! else uses the default.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::{LlmProvider, TaskHint};

const CLOUD_TIMEOUT: Duration = Duration::from_secs(60);

/// Provider backed by an OpenAI-compatible cloud API.
pub struct CloudProvider {
    base_url: String,
    api_key: secrecy::SecretString,
    default_model: String,
    model_reasoning: String,
    model_coding: String,
    model_long_context: String,
    model_creative: String,
    model_budget: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl CloudProvider {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            base_url: config.cloud_base_url.clone(),
            api_key: config.cloud_api_key.clone(),
            default_model: config.cloud_model.clone(),
            model_reasoning: config.model_reasoning.clone(),
            model_coding: config.model_coding.clone(),
            model_long_context: config.model_long_context.clone(),
            model_creative: config.model_creative.clone(),
            model_budget: config.model_budget.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Pick the model for a task hint.
    fn model_for(&self, hint: TaskHint) -> &str {
        match hint {
            TaskHint::DeepReasoning => &self.model_reasoning,
            TaskHint::Coding | TaskHint::CodeReviewDeep => &self.model_coding,
            TaskHint::LongContext => &self.model_long_context,
            TaskHint::Creative => &self.model_creative,
            TaskHint::Budget => &self.model_budget,
            _ => &self.default_model,
        }
    }
}

#[async_trait]
impl LlmProvider for CloudProvider {
    fn name(&self) -> &str {
        "cloud"
    }

    /// Configured — an API key is present.
    async fn is_usable(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }

    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
        hint: TaskHint,
    ) -> Result<String, LlmError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(LlmError::NotConfigured {
                provider: "cloud".into(),
            });
        }

        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": prompt}));

        let model = self.model_for(hint);
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        tracing::debug!(model = %model, task = hint.as_str(), "Cloud completion request");
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .timeout(CLOUD_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        provider: "cloud".into(),
                        timeout: CLOUD_TIMEOUT,
                    }
                } else {
                    LlmError::RequestFailed {
                        provider: "cloud".into(),
                        reason: e.to_string(),
                    }
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                provider: "cloud".into(),
                reason: format!("HTTP {status}: {detail}"),
            });
        }

        let parsed: CompletionResponse =
            resp.json().await.map_err(|e| LlmError::InvalidResponse {
                provider: "cloud".into(),
                reason: e.to_string(),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: "cloud".into(),
                reason: "empty choices array".into(),
            })
    }
}
