//! Project management tool: create, delete, list.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use crate::mcp::tools::{arg_str, resolve_project};
use crate::mcp::{Tool, ToolResult};
use crate::store::{Database, Project};

pub struct ProjectsTool {
    db: Arc<dyn Database>,
}

impl ProjectsTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    async fn create(&self, name: Option<&str>, description: &str) -> ToolResult {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return ToolResult::fail("Project name required.");
        };

        match self.db.get_project_by_name(name).await {
            Ok(Some(_)) => return ToolResult::fail(format!("Project '{name}' already exists.")),
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "Create project lookup failed");
                return ToolResult::fail(e.to_string());
            }
        }

        let project = Project::new(name, description);
        match self.db.insert_project(&project).await {
            Ok(()) => ToolResult::ok_with_data(
                format!("Created project '{name}'."),
                serde_json::json!({"id": project.id}),
            ),
            Err(e) => {
                error!(error = %e, "Create project failed");
                ToolResult::fail(e.to_string())
            }
        }
    }

    async fn delete(&self, name: Option<&str>) -> ToolResult {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return ToolResult::fail("Project name required.");
        };

        let project = match resolve_project(&self.db, name).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                return ToolResult::fail(format!("Project not found (searched for '{name}')"));
            }
            Err(e) => {
                error!(error = %e, "Delete project lookup failed");
                return ToolResult::fail(e.to_string());
            }
        };

        let deleted_name = project.name.clone();
        match self.db.delete_project(project.id).await {
            Ok(()) => ToolResult::ok(format!("Deleted project '{deleted_name}'.")),
            Err(e) => {
                error!(error = %e, "Delete project failed");
                ToolResult::fail(e.to_string())
            }
        }
    }

    async fn list(&self) -> ToolResult {
        match self.db.list_active_projects(50).await {
            Ok(projects) => {
                let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
                ToolResult::ok(format!("Active Projects: {}", names.join(", ")))
            }
            Err(e) => ToolResult::fail(e.to_string()),
        }
    }
}

#[async_trait]
impl Tool for ProjectsTool {
    fn name(&self) -> &str {
        "projects"
    }

    fn description(&self) -> &str {
        "Manage projects: create, delete, list. Name matching is exact, then case-insensitive."
    }

    async fn run(&self, action: &str, args: &serde_json::Value) -> ToolResult {
        match action {
            "create" => {
                self.create(arg_str(args, "name"), arg_str(args, "description").unwrap_or(""))
                    .await
            }
            "delete" => self.delete(arg_str(args, "name")).await,
            "list" => self.list().await,
            other => ToolResult::fail(format!("Unknown action: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LibSqlBackend;

    async fn tool() -> ProjectsTool {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        ProjectsTool::new(db)
    }

    #[tokio::test]
    async fn create_list_delete_round_trip() {
        let tool = tool().await;

        let res = tool
            .run("create", &serde_json::json!({"name": "Apollo", "description": "d"}))
            .await;
        assert!(res.success);
        assert!(res.output.contains("Created project 'Apollo'"));

        let res = tool.run("list", &serde_json::json!({})).await;
        assert!(res.success);
        assert!(res.output.contains("Apollo"));

        // Case-insensitive delete.
        let res = tool.run("delete", &serde_json::json!({"name": "apollo"})).await;
        assert!(res.success);
        assert!(res.output.contains("Deleted project 'Apollo'"));
    }

    #[tokio::test]
    async fn duplicate_create_fails_explicitly() {
        let tool = tool().await;
        tool.run("create", &serde_json::json!({"name": "Apollo"})).await;

        let res = tool.run("create", &serde_json::json!({"name": "Apollo"})).await;
        assert!(!res.success);
        assert!(res.output.contains("already exists"));
    }

    #[tokio::test]
    async fn missing_name_and_unknown_action() {
        let tool = tool().await;

        let res = tool.run("create", &serde_json::json!({})).await;
        assert!(!res.success);

        let res = tool.run("explode", &serde_json::json!({})).await;
        assert!(!res.success);
        assert!(res.output.contains("Unknown action"));
    }

    #[tokio::test]
    async fn delete_unknown_project_fails() {
        let tool = tool().await;
        let res = tool.run("delete", &serde_json::json!({"name": "Ghost"})).await;
        assert!(!res.success);
        assert!(res.output.contains("not found"));
    }
}
