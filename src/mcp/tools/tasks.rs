//! Task management tool: create, update status, bulk update, list.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::error;
use uuid::Uuid;

use crate::mcp::tools::{arg_str, resolve_project};
use crate::mcp::{Tool, ToolResult};
use crate::store::{Database, Project, Task, TaskPriority, TaskStatus};

pub struct TasksTool {
    db: Arc<dyn Database>,
}

impl TasksTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    async fn create(
        &self,
        project_name: &str,
        title: Option<&str>,
        description: &str,
        priority: &str,
    ) -> ToolResult {
        let Some(title) = title.filter(|t| !t.is_empty()) else {
            return ToolResult::fail("Task title required.");
        };

        let project = match resolve_project(&self.db, project_name).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                // The default bucket is created on demand; anything else must
                // already exist.
                if project_name.eq_ignore_ascii_case("general") {
                    let project = Project::new("General", "Default project");
                    if let Err(e) = self.db.insert_project(&project).await {
                        error!(error = %e, "Auto-create of General project failed");
                        return ToolResult::fail(e.to_string());
                    }
                    project
                } else {
                    return ToolResult::fail(format!("Project '{project_name}' not found."));
                }
            }
            Err(e) => {
                error!(error = %e, "Create task project lookup failed");
                return ToolResult::fail(e.to_string());
            }
        };

        let task = Task::new(
            project.id,
            title,
            description,
            TaskPriority::parse_or_default(priority),
        );
        match self.db.insert_task(&task).await {
            Ok(()) => ToolResult::ok_with_data(
                format!("Created task '{title}' in '{}'.", project.name),
                serde_json::json!({"id": task.id, "project_id": project.id}),
            ),
            Err(e) => {
                error!(error = %e, "Create task failed");
                ToolResult::fail(e.to_string())
            }
        }
    }

    async fn update_status(
        &self,
        task_id: Option<&str>,
        title: Option<&str>,
        status: Option<&str>,
    ) -> ToolResult {
        let Some(status_str) = status else {
            return ToolResult::fail("Status required.");
        };
        let Some(status) = TaskStatus::parse(status_str) else {
            return ToolResult::fail(format!("Invalid status: {status_str}"));
        };

        let mut task = None;
        if let Some(id) = task_id.and_then(|s| Uuid::parse_str(s).ok()) {
            task = self.db.get_task(id).await.unwrap_or(None);
        }
        if task.is_none()
            && let Some(title) = title
        {
            task = match self.db.get_task_by_title_ci(title).await {
                Ok(task) => task,
                Err(e) => {
                    error!(error = %e, "Update task lookup failed");
                    return ToolResult::fail(e.to_string());
                }
            };
        }

        let Some(task) = task else {
            return ToolResult::fail("Task not found.");
        };

        let completed_at = (status == TaskStatus::Done).then(Utc::now);
        match self.db.update_task_status(task.id, status, completed_at).await {
            Ok(()) => ToolResult::ok(format!(
                "Updated task '{}' to {}.",
                task.title,
                status.as_str()
            )),
            Err(e) => {
                error!(error = %e, "Update task failed");
                ToolResult::fail(e.to_string())
            }
        }
    }

    async fn update_all(&self, project_name: Option<&str>, status: Option<&str>) -> ToolResult {
        let Some(status_str) = status else {
            return ToolResult::fail("Status required.");
        };
        let Some(status) = TaskStatus::parse(status_str) else {
            return ToolResult::fail(format!("Invalid status: {status_str}"));
        };

        let project_filter = match project_name {
            Some(name) => match resolve_project(&self.db, name).await {
                Ok(Some(project)) => Some(project.id),
                Ok(None) => return ToolResult::fail(format!("Project '{name}' not found.")),
                Err(e) => return ToolResult::fail(e.to_string()),
            },
            None => None,
        };

        let tasks = match self.db.list_tasks(project_filter).await {
            Ok(tasks) => tasks,
            Err(e) => return ToolResult::fail(e.to_string()),
        };

        // Marking everything done should not re-mark what already is — the
        // reported count means rows actually mutated.
        let targets: Vec<&Task> = tasks
            .iter()
            .filter(|t| status != TaskStatus::Done || t.status != TaskStatus::Done)
            .collect();

        if targets.is_empty() {
            return ToolResult::fail("No tasks found to update.");
        }

        let completed_at = (status == TaskStatus::Done).then(Utc::now);
        let mut count = 0usize;
        for task in targets {
            match self.db.update_task_status(task.id, status, completed_at).await {
                Ok(()) => count += 1,
                Err(e) => {
                    error!(task_id = %task.id, error = %e, "Bulk update failed mid-way");
                    return ToolResult::fail(format!(
                        "Bulk update stopped after {count} tasks: {e}"
                    ));
                }
            }
        }

        ToolResult::ok(format!("Bulk updated {count} tasks to '{status_str}'."))
    }

    async fn list(&self, project_name: Option<&str>) -> ToolResult {
        let (tasks, prefix) = match project_name {
            Some(name) => {
                let project = match resolve_project(&self.db, name).await {
                    Ok(Some(project)) => project,
                    Ok(None) => return ToolResult::fail(format!("Project '{name}' not found.")),
                    Err(e) => return ToolResult::fail(e.to_string()),
                };
                match self.db.list_tasks(Some(project.id)).await {
                    Ok(tasks) => (tasks, format!("Tasks for '{}':", project.name)),
                    Err(e) => return ToolResult::fail(e.to_string()),
                }
            }
            None => match self.db.list_pending_tasks(20).await {
                Ok(tasks) => (tasks, "Recent active tasks:".to_string()),
                Err(e) => return ToolResult::fail(e.to_string()),
            },
        };

        if tasks.is_empty() {
            return ToolResult::ok(format!("{prefix} None found."));
        }

        let lines: Vec<String> = tasks
            .iter()
            .map(|t| format!("- [{}] {} ({})", t.status.as_str(), t.title, t.priority.as_str()))
            .collect();
        ToolResult::ok(format!("{prefix}\n{}", lines.join("\n")))
    }
}

#[async_trait]
impl Tool for TasksTool {
    fn name(&self) -> &str {
        "tasks"
    }

    fn description(&self) -> &str {
        "Manage tasks: create, update_status, update_all, list. Project resolution is exact, \
         then case-insensitive."
    }

    async fn run(&self, action: &str, args: &serde_json::Value) -> ToolResult {
        match action {
            "create" => {
                self.create(
                    arg_str(args, "project").unwrap_or("General"),
                    arg_str(args, "title"),
                    arg_str(args, "description").unwrap_or(""),
                    arg_str(args, "priority").unwrap_or("medium"),
                )
                .await
            }
            "update_status" => {
                self.update_status(
                    arg_str(args, "task_id"),
                    arg_str(args, "title"),
                    arg_str(args, "status"),
                )
                .await
            }
            "update_all" => {
                self.update_all(arg_str(args, "project"), arg_str(args, "status"))
                    .await
            }
            "list" => self.list(arg_str(args, "project")).await,
            other => ToolResult::fail(format!("Unknown action: {other}")),
        }
    }
}
