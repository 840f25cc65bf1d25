//! Built-in tools for project and task mutation.

pub mod projects;
pub mod tasks;

pub use projects::ProjectsTool;
pub use tasks::TasksTool;

use std::sync::Arc;

use crate::error::DatabaseError;
use crate::store::{Database, Project};

/// Extract a string argument.
pub(crate) fn arg_str<'a>(args: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

/// Resolve a human-supplied project name: exact match first, then
/// case-insensitive exact match. Nothing fuzzier — typo correction belongs
/// upstream in the LLM normalization step, never here.
pub(crate) async fn resolve_project(
    db: &Arc<dyn Database>,
    name: &str,
) -> Result<Option<Project>, DatabaseError> {
    if let Some(project) = db.get_project_by_name(name).await? {
        return Ok(Some(project));
    }
    db.get_project_by_name_ci(name).await
}
