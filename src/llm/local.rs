//! Local provider — talks to an Ollama-compatible server.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::LlmError;
use crate::llm::{LlmProvider, TaskHint};

/// Local inference is slow; give it room.
const LOCAL_TIMEOUT: Duration = Duration::from_secs(120);
/// Availability probe must be quick — it gates the fallback decision.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Provider backed by a local Ollama-compatible server.
pub struct LocalProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl LocalProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    /// Health check — is the server running?
    async fn is_usable(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
        _hint: TaskHint,
    ) -> Result<String, LlmError> {
        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": prompt}));

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });

        tracing::debug!(model = %self.model, "Local completion request");
        let resp = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .timeout(LOCAL_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        provider: "local".into(),
                        timeout: LOCAL_TIMEOUT,
                    }
                } else {
                    LlmError::RequestFailed {
                        provider: "local".into(),
                        reason: e.to_string(),
                    }
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                provider: "local".into(),
                reason: format!("HTTP {status}: {detail}"),
            });
        }

        let parsed: ChatResponse = resp.json().await.map_err(|e| LlmError::InvalidResponse {
            provider: "local".into(),
            reason: e.to_string(),
        })?;
        Ok(parsed.message.content)
    }
}
