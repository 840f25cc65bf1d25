//! Name-keyed registry for context providers, prompt formatters, and tools.
//!
//! Built once at startup, then shared immutably behind an `Arc` — there is
//! no runtime registration, so lookups take `&self` and need no locking.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::mcp::{ContextProvider, PromptFormatter, Tool};

/// Aggregate context keyed by provider name. A `BTreeMap` keeps key order
/// deterministic even when providers complete in arbitrary order.
pub type ContextBundle = BTreeMap<String, serde_json::Value>;

/// Registry of pluggable capabilities. Names are unique per category;
/// re-registering a name overwrites the previous entry with a warning.
#[derive(Default)]
pub struct McpRegistry {
    providers: HashMap<String, Arc<dyn ContextProvider>>,
    formatters: HashMap<String, Arc<dyn PromptFormatter>>,
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl McpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a context provider.
    pub fn register_provider(&mut self, provider: Arc<dyn ContextProvider>) {
        let name = provider.name().to_string();
        if self.providers.insert(name.clone(), provider).is_some() {
            warn!(provider = %name, "Overwriting existing context provider");
        } else {
            debug!(provider = %name, "Registered context provider");
        }
    }

    /// Register a prompt formatter.
    pub fn register_formatter(&mut self, formatter: Arc<dyn PromptFormatter>) {
        let name = formatter.name().to_string();
        if self.formatters.insert(name.clone(), formatter).is_some() {
            warn!(formatter = %name, "Overwriting existing prompt formatter");
        } else {
            debug!(formatter = %name, "Registered prompt formatter");
        }
    }

    /// Register a tool.
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Overwriting existing tool");
        } else {
            debug!(tool = %name, "Registered tool");
        }
    }

    pub fn formatter(&self, name: &str) -> Option<Arc<dyn PromptFormatter>> {
        self.formatters.get(name).cloned()
    }

    pub fn tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Assemble the aggregate context bundle.
    ///
    /// Runs the named providers (all of them when `names` is `None`)
    /// concurrently. One provider failing does not abort the bundle: its
    /// slot becomes an explicit error placeholder and every other provider
    /// still runs. Requested names with no registered provider are skipped.
    pub async fn global_context(&self, names: Option<&[&str]>) -> ContextBundle {
        let targets: Vec<Arc<dyn ContextProvider>> = match names {
            Some(names) => names
                .iter()
                .filter_map(|n| self.providers.get(*n).cloned())
                .collect(),
            None => self.providers.values().cloned().collect(),
        };

        let fetches = targets.iter().map(|provider| {
            let provider = Arc::clone(provider);
            async move {
                let name = provider.name().to_string();
                let value = match provider.get_context().await {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(provider = %name, error = %e, "Context provider failed");
                        serde_json::Value::String(format!("Error fetching {name}"))
                    }
                };
                (name, value)
            }
        });

        join_all(fetches).await.into_iter().collect()
    }
}
