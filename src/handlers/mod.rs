//! Specialized handlers.
//!
//! Each handler satisfies the same capability — `handle(input) -> reply` —
//! and is bound to one identity in the closed [`HandlerKind`] set. Dispatch
//! is a map lookup keyed by the enum, so the call site stays statically
//! typed while handlers remain pluggable.

pub mod coder;
pub mod mentor;
pub mod planner;
pub mod scholar;

pub use coder::CoderHandler;
pub use mentor::MentorHandler;
pub use planner::PlannerHandler;
pub use scholar::ScholarHandler;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::HandlerError;
use crate::mcp::ContextBundle;
use crate::router::HandlerKind;

/// Input to a dispatched handler: the original message, the resolved action
/// tag, and a freshly fetched context bundle.
pub struct HandlerInput {
    pub message: String,
    pub action: &'static str,
    pub context: ContextBundle,
}

/// The uniform reply every handler produces.
///
/// `success: false` is a delivered answer, not a crash — tool refusals and
/// unconfigured integrations surface this way.
#[derive(Debug, Clone, Serialize)]
pub struct AgentReply {
    pub output: String,
    pub agent: String,
    pub success: bool,
}

impl AgentReply {
    pub fn ok(agent: HandlerKind, output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            agent: agent.label().to_string(),
            success: true,
        }
    }

    pub fn failure(agent: HandlerKind, output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            agent: agent.label().to_string(),
            success: false,
        }
    }
}

/// Pull a text slot out of a bundle, with an explicit fallback for missing
/// or structured slots.
pub(crate) fn context_text<'a>(
    bundle: &'a ContextBundle,
    key: &str,
    fallback: &'a str,
) -> &'a str {
    bundle.get(key).and_then(|v| v.as_str()).unwrap_or(fallback)
}

/// Pull the list of known project names out of a bundle.
pub(crate) fn context_project_names(bundle: &ContextBundle) -> Vec<String> {
    bundle
        .get("project_list")
        .and_then(|v| v.as_array())
        .map(|names| {
            names
                .iter()
                .filter_map(|n| n.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// A specialized responder bound to one handler identity.
#[async_trait]
pub trait Handler: Send + Sync {
    fn kind(&self) -> HandlerKind;

    async fn handle(&self, input: &HandlerInput) -> Result<AgentReply, HandlerError>;
}

/// Closed map from handler identity to implementation.
#[derive(Default)]
pub struct HandlerSet {
    handlers: HashMap<HandlerKind, Arc<dyn Handler>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handler: Arc<dyn Handler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: HandlerKind) -> Option<Arc<dyn Handler>> {
        self.handlers.get(&kind).cloned()
    }
}
