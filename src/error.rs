//! Error types for aide.
//!
//! One enum per failure domain. The orchestrator decides per kind whether a
//! failure degrades to an inline message, is swallowed and logged, or
//! surfaces at the HTTP boundary (only a gateway with no usable provider
//! does).

use std::time::Duration;

/// Top-level error type for the assistant core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Inference gateway / provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} is not configured")]
    NotConfigured { provider: String },

    #[error("No usable inference provider (local unavailable, cloud not configured)")]
    NoUsableProvider,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} '{id}'")]
    NotFound { entity: String, id: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Tool registry / invocation errors.
///
/// Tool *outcomes* (duplicate create, invalid status, missing entity) are not
/// errors — they come back as `ToolResult { success: false, .. }`. This enum
/// covers the cases where a tool could not be invoked at all.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool {name} not found")]
    NotFound { name: String },

    #[error("Tool {name} execution failed: {reason}")]
    ExecutionFailed { name: String, reason: String },
}

/// Handler dispatch errors.
///
/// Caught at the orchestrator boundary and converted into a reported,
/// non-fatal reply — they never abort a request.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Llm(#[from] LlmError),

    #[error("{0}")]
    Tool(#[from] ToolError),

    #[error("{0}")]
    Database(#[from] DatabaseError),

    #[error("Normalization failed: {0}")]
    Normalization(String),
}

/// Result type alias for the assistant core.
pub type Result<T> = std::result::Result<T, Error>;
