//! Built-in context providers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::Error;
use crate::mcp::ContextProvider;
use crate::store::Database;

/// Summarized status of active projects.
pub struct ProjectsProvider {
    db: Arc<dyn Database>,
}

impl ProjectsProvider {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContextProvider for ProjectsProvider {
    fn name(&self) -> &str {
        "projects"
    }

    async fn get_context(&self) -> Result<serde_json::Value, Error> {
        let projects = self.db.list_active_projects(10).await?;
        if projects.is_empty() {
            return Ok(serde_json::Value::String(
                "No active projects found.".to_string(),
            ));
        }

        let lines: Vec<String> = projects
            .iter()
            .map(|p| {
                let description = if p.description.is_empty() {
                    "No description"
                } else {
                    &p.description
                };
                format!("- {}: {}", p.name, description)
            })
            .collect();
        Ok(serde_json::Value::String(lines.join("\n")))
    }
}

/// Bare list of active project names — used by the pre-tool normalization
/// step to map free text onto stored projects.
pub struct ProjectListProvider {
    db: Arc<dyn Database>,
}

impl ProjectListProvider {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContextProvider for ProjectListProvider {
    fn name(&self) -> &str {
        "project_list"
    }

    async fn get_context(&self) -> Result<serde_json::Value, Error> {
        let projects = self.db.list_active_projects(50).await?;
        let names: Vec<serde_json::Value> = projects
            .into_iter()
            .map(|p| serde_json::Value::String(p.name))
            .collect();
        Ok(serde_json::Value::Array(names))
    }
}

/// Summarized list of pending tasks, most urgent first.
pub struct TasksProvider {
    db: Arc<dyn Database>,
}

impl TasksProvider {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContextProvider for TasksProvider {
    fn name(&self) -> &str {
        "tasks"
    }

    async fn get_context(&self) -> Result<serde_json::Value, Error> {
        let tasks = self.db.list_pending_tasks(20).await?;
        if tasks.is_empty() {
            return Ok(serde_json::Value::String("No pending tasks.".to_string()));
        }

        let lines: Vec<String> = tasks
            .iter()
            .map(|t| {
                format!(
                    "- [{}] {} (priority: {})",
                    t.status.as_str(),
                    t.title,
                    t.priority.as_str()
                )
            })
            .collect();
        Ok(serde_json::Value::String(lines.join("\n")))
    }
}

/// Current wall-clock time stamp.
pub struct TimeProvider;

#[async_trait]
impl ContextProvider for TimeProvider {
    fn name(&self) -> &str {
        "time"
    }

    async fn get_context(&self) -> Result<serde_json::Value, Error> {
        Ok(serde_json::Value::String(format!(
            "[Time: {}]",
            Utc::now().format("%Y-%m-%d %H:%M")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LibSqlBackend, Project, Task, TaskPriority};

    async fn db_with_data() -> Arc<dyn Database> {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let project = Project::new("Apollo", "moon shot");
        db.insert_project(&project).await.unwrap();
        db.insert_task(&Task::new(project.id, "land softly", "", TaskPriority::High))
            .await
            .unwrap();
        Arc::new(db)
    }

    #[tokio::test]
    async fn projects_provider_summarizes() {
        let provider = ProjectsProvider::new(db_with_data().await);
        let value = provider.get_context().await.unwrap();
        let text = value.as_str().unwrap();
        assert!(text.contains("- Apollo: moon shot"));
    }

    #[tokio::test]
    async fn empty_projects_placeholder() {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let provider = ProjectsProvider::new(db);
        let value = provider.get_context().await.unwrap();
        assert_eq!(value.as_str().unwrap(), "No active projects found.");
    }

    #[tokio::test]
    async fn tasks_provider_lists_pending() {
        let provider = TasksProvider::new(db_with_data().await);
        let value = provider.get_context().await.unwrap();
        let text = value.as_str().unwrap();
        assert!(text.contains("[todo] land softly (priority: high)"));
    }

    #[tokio::test]
    async fn project_list_is_structured() {
        let provider = ProjectListProvider::new(db_with_data().await);
        let value = provider.get_context().await.unwrap();
        assert_eq!(value, serde_json::json!(["Apollo"]));
    }

    #[tokio::test]
    async fn time_provider_stamps() {
        let value = TimeProvider.get_context().await.unwrap();
        assert!(value.as_str().unwrap().starts_with("[Time: "));
    }
}
