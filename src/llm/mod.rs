//! Inference gateway.
//!
//! One call surface over two interchangeable text-completion providers:
//! a local Ollama-compatible server and an OpenAI-compatible cloud endpoint.
//! The routing policy picks one per call (task hint, then prompt size); a
//! chosen provider that is unusable or fails gets exactly one fallback to
//! the other before the call fails outward. Reasoning-trace spans are
//! stripped from every response before it reaches a caller.

pub mod cloud;
pub mod local;
pub mod reasoning;
pub mod router;

pub use cloud::CloudProvider;
pub use local::LocalProvider;
pub use router::{ProviderKind, TaskHint, approx_tokens};

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::error::LlmError;

/// A text-completion provider. Pure with respect to the core: prompt in,
/// text out.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the provider can currently serve requests (running, for the
    /// local slot; configured, for the cloud slot).
    async fn is_usable(&self) -> bool;

    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
        hint: TaskHint,
    ) -> Result<String, LlmError>;
}

/// The inference gateway. Every LLM call in the system goes through here —
/// nothing talks to a provider directly.
pub struct Gateway {
    local: Arc<dyn LlmProvider>,
    cloud: Arc<dyn LlmProvider>,
    local_token_threshold: usize,
}

impl Gateway {
    pub fn new(
        local: Arc<dyn LlmProvider>,
        cloud: Arc<dyn LlmProvider>,
        local_token_threshold: usize,
    ) -> Self {
        Self {
            local,
            cloud,
            local_token_threshold,
        }
    }

    /// Build the gateway with the standard local + cloud providers.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(
            Arc::new(LocalProvider::new(
                config.local_base_url.clone(),
                config.local_model.clone(),
            )),
            Arc::new(CloudProvider::from_config(config)),
            config.local_token_threshold,
        )
    }

    fn provider(&self, kind: ProviderKind) -> &Arc<dyn LlmProvider> {
        match kind {
            ProviderKind::Local => &self.local,
            ProviderKind::Cloud => &self.cloud,
        }
    }

    /// Complete a prompt.
    ///
    /// `force` overrides the routing policy. The chosen provider gets one
    /// attempt; on unavailability, misconfiguration, or call failure the
    /// alternate provider gets one attempt. Two dead providers is the only
    /// fatal outcome (`LlmError::NoUsableProvider`).
    pub async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
        hint: TaskHint,
        force: Option<ProviderKind>,
    ) -> Result<String, LlmError> {
        let chosen =
            force.unwrap_or_else(|| router::route(prompt, hint, self.local_token_threshold));
        let alternate = match chosen {
            ProviderKind::Local => ProviderKind::Cloud,
            ProviderKind::Cloud => ProviderKind::Local,
        };

        let primary_err = match self.try_provider(chosen, prompt, system, hint).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        tracing::warn!(
            provider = chosen.as_str(),
            error = %primary_err,
            "Provider failed, falling back once"
        );

        match self.try_provider(alternate, prompt, system, hint).await {
            Ok(text) => Ok(text),
            Err(LlmError::NotConfigured { .. })
                if matches!(primary_err, LlmError::NotConfigured { .. }) =>
            {
                Err(LlmError::NoUsableProvider)
            }
            Err(e) => Err(e),
        }
    }

    async fn try_provider(
        &self,
        kind: ProviderKind,
        prompt: &str,
        system: Option<&str>,
        hint: TaskHint,
    ) -> Result<String, LlmError> {
        let provider = self.provider(kind);
        if !provider.is_usable().await {
            return Err(LlmError::NotConfigured {
                provider: provider.name().to_string(),
            });
        }
        let text = provider.complete(prompt, system, hint).await?;
        Ok(reasoning::strip_reasoning(&text))
    }
}
