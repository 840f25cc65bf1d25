//! Intent router — classifies a message into exactly one handler.
//!
//! One LLM call per message, against a fixed rubric with a closed label set.
//! The router never fails: an invalid label, unparseable output, or a dead
//! gateway all collapse to the catch-all handler.

use std::sync::Arc;

use tracing::{info, warn};

use crate::llm::{Gateway, TaskHint};

/// The closed set of handler identities a message can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Projects, tasks, deadlines, issue sync, note export.
    Planner,
    /// Research, summaries, learning paths.
    Scholar,
    /// Career strategy, skill gaps, growth planning.
    Mentor,
    /// Code review, debugging, architecture.
    Coder,
    /// General conversation — the catch-all.
    Assistant,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 5] = [
        Self::Planner,
        Self::Scholar,
        Self::Mentor,
        Self::Coder,
        Self::Assistant,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Planner => "PLANNER",
            Self::Scholar => "SCHOLAR",
            Self::Mentor => "MENTOR",
            Self::Coder => "CODER",
            Self::Assistant => "ASSISTANT",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "PLANNER" => Some(Self::Planner),
            "SCHOLAR" => Some(Self::Scholar),
            "MENTOR" => Some(Self::Mentor),
            "CODER" => Some(Self::Coder),
            "ASSISTANT" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Whether this is the catch-all conversational handler.
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Self::Assistant)
    }
}

fn routing_prompt(message: &str) -> String {
    format!(
        "Classify this user message to the correct assistant handler.\n\
         \n\
         Message: \"{message}\"\n\
         \n\
         Decision rules, in priority order:\n\
         1. Explicit create/update/delete/list requests for projects or tasks -> PLANNER\n\
         2. Research, papers, learning, summaries, knowledge base -> SCHOLAR\n\
         3. Career goals, job strategy, skill gaps, resume, growth planning -> MENTOR\n\
         4. Code help, debugging, architecture review, refactoring, tech decisions -> CODER\n\
         5. Any other operational project/task/deadline matter -> PLANNER\n\
         6. General conversation, greetings, system questions, anything else -> ASSISTANT\n\
         \n\
         Reply with ONLY the handler name. Example: CODER"
    )
}

/// LLM-backed classifier with a deterministic fallback.
pub struct IntentRouter {
    gateway: Arc<Gateway>,
}

impl IntentRouter {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Route a message. Exactly one classification call, no retry; every
    /// failure mode falls back to [`HandlerKind::Assistant`].
    pub async fn route(&self, message: &str) -> HandlerKind {
        let prompt = routing_prompt(message);
        let response = match self
            .gateway
            .complete(&prompt, None, TaskHint::Routing, None)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Routing call failed, defaulting to ASSISTANT");
                return HandlerKind::Assistant;
            }
        };

        // First whitespace-delimited token, uppercased — tolerates trailing
        // chatter after the label.
        let label = response
            .split_whitespace()
            .next()
            .map(|t| t.to_uppercase())
            .unwrap_or_default();

        match HandlerKind::from_label(&label) {
            Some(kind) => {
                info!(handler = kind.label(), "Routed");
                kind
            }
            None => {
                warn!(label = %label, "Invalid route, defaulting to ASSISTANT");
                HandlerKind::Assistant
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::error::LlmError;
    use crate::llm::LlmProvider;

    struct ScriptedProvider {
        usable: bool,
        reply: &'static str,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn is_usable(&self) -> bool {
            self.usable
        }

        async fn complete(
            &self,
            _prompt: &str,
            _system: Option<&str>,
            _hint: crate::llm::TaskHint,
        ) -> Result<String, LlmError> {
            Ok(self.reply.to_string())
        }
    }

    fn router_with_reply(reply: &'static str) -> IntentRouter {
        let provider = Arc::new(ScriptedProvider { usable: true, reply });
        IntentRouter::new(Arc::new(Gateway::new(provider.clone(), provider, 2000)))
    }

    fn router_with_dead_gateway() -> IntentRouter {
        let provider = Arc::new(ScriptedProvider {
            usable: false,
            reply: "",
        });
        IntentRouter::new(Arc::new(Gateway::new(provider.clone(), provider, 2000)))
    }

    #[test]
    fn labels_round_trip() {
        for kind in HandlerKind::ALL {
            assert_eq!(HandlerKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(HandlerKind::from_label("PLUMBER"), None);
    }

    #[tokio::test]
    async fn parses_label_with_trailing_chatter() {
        let router = router_with_reply("coder — this is clearly a code question");
        assert_eq!(router.route("fix my bug").await, HandlerKind::Coder);
    }

    #[tokio::test]
    async fn strips_reasoning_before_parsing() {
        let router = router_with_reply("<think>tasks, so operational</think>PLANNER");
        assert_eq!(router.route("add a task").await, HandlerKind::Planner);
    }

    #[tokio::test]
    async fn invalid_label_defaults_to_catch_all() {
        let router = router_with_reply("I believe this should go to OPERATIONS");
        assert_eq!(router.route("whatever").await, HandlerKind::Assistant);
    }

    #[tokio::test]
    async fn empty_output_defaults_to_catch_all() {
        let router = router_with_reply("   ");
        assert_eq!(router.route("hello").await, HandlerKind::Assistant);
    }

    #[tokio::test]
    async fn gateway_failure_defaults_to_catch_all() {
        let router = router_with_dead_gateway();
        assert_eq!(router.route("hello").await, HandlerKind::Assistant);
    }
}
