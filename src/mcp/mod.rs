//! Pluggable context/tool layer.
//!
//! Three capability kinds compose the system's prompts and actions without
//! the router or handlers knowing about each other at compile time:
//!
//! - **Context providers** fetch live system state (projects, tasks, time)
//!   as text or structured data.
//! - **Prompt formatters** fold an aggregate context bundle plus recent
//!   conversation history into a persona system prompt.
//! - **Tools** are named side-effecting actions invoked with keyword
//!   arguments, returning a uniform success/output result. They are the only
//!   things in the core allowed to mutate domain state.
//!
//! All three are registered by name in an [`registry::McpRegistry`] built
//! once at startup and injected wherever needed.

pub mod formatters;
pub mod providers;
pub mod registry;
pub mod tools;

pub use registry::{ContextBundle, McpRegistry};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Error;

/// A pluggable source of live system state.
///
/// Providers are stateless with respect to the registry; caching, if any,
/// is the provider's own concern.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Unique name within the provider category.
    fn name(&self) -> &str;

    /// Fetch the current state as text or a structured value.
    async fn get_context(&self) -> Result<serde_json::Value, Error>;
}

/// A pure prompt formatter: context bundle + history text → system prompt.
pub trait PromptFormatter: Send + Sync {
    /// Unique name within the formatter category.
    fn name(&self) -> &str;

    /// Format the system prompt. Missing bundle keys must degrade to
    /// explicit placeholders, never fail.
    fn format(&self, bundle: &ContextBundle, history: Option<&str>) -> String;
}

/// Uniform result of a tool invocation.
///
/// Tool-level failures (duplicate create, unknown entity, invalid status)
/// are values, not errors — callers surface `output` either way.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn ok_with_data(output: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: Some(data),
        }
    }

    pub fn fail(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            data: None,
        }
    }
}

/// A named side-effecting action.
///
/// The registry performs no validation of `args` — each tool owns its own
/// argument handling and reports problems through [`ToolResult::fail`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within the tool category.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Execute one action with keyword arguments.
    async fn run(&self, action: &str, args: &serde_json::Value) -> ToolResult;
}
