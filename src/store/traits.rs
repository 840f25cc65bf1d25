//! Unified `Database` trait — single async interface for all persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::models::{Project, Session, Task, TaskStatus};

/// Backend-agnostic database trait covering projects, tasks, and sessions.
#[async_trait]
pub trait Database: Send + Sync {
    // ── Projects ────────────────────────────────────────────────────

    /// Insert a new project. Fails on a duplicate name.
    async fn insert_project(&self, project: &Project) -> Result<(), DatabaseError>;

    /// Look up a project by exact name.
    async fn get_project_by_name(&self, name: &str) -> Result<Option<Project>, DatabaseError>;

    /// Look up a project by case-insensitive exact name.
    async fn get_project_by_name_ci(&self, name: &str) -> Result<Option<Project>, DatabaseError>;

    /// List active projects, up to `limit`.
    async fn list_active_projects(&self, limit: usize) -> Result<Vec<Project>, DatabaseError>;

    /// Delete a project and its tasks.
    async fn delete_project(&self, id: Uuid) -> Result<(), DatabaseError>;

    // ── Tasks ───────────────────────────────────────────────────────

    /// Insert a new task.
    async fn insert_task(&self, task: &Task) -> Result<(), DatabaseError>;

    /// Look up a task by id.
    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, DatabaseError>;

    /// Find the most recently created task whose title matches
    /// case-insensitively.
    async fn get_task_by_title_ci(&self, title: &str) -> Result<Option<Task>, DatabaseError>;

    /// List tasks, optionally scoped to one project, newest first.
    async fn list_tasks(&self, project_id: Option<Uuid>) -> Result<Vec<Task>, DatabaseError>;

    /// List tasks that are not done, up to `limit`.
    async fn list_pending_tasks(&self, limit: usize) -> Result<Vec<Task>, DatabaseError>;

    /// Update a task's status (and completion timestamp, when provided).
    async fn update_task_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError>;

    // ── Sessions ────────────────────────────────────────────────────

    /// Load a session by its opaque id.
    async fn load_session(&self, session_id: &str) -> Result<Option<Session>, DatabaseError>;

    /// Upsert a session document (turn log included).
    ///
    /// This is a whole-document write: two concurrent writers to the same
    /// session id race, and the last save wins.
    async fn save_session(&self, session: &Session) -> Result<(), DatabaseError>;

    /// List all sessions, most recently active first.
    async fn list_sessions(&self) -> Result<Vec<Session>, DatabaseError>;
}
