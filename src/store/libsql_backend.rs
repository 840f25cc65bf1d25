//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. Sessions are stored as one
//! JSON turn-log document per row; a session save overwrites the whole
//! document, so concurrent writers to the same id are last-write-wins.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::models::{
    Project, ProjectStatus, Session, Task, TaskPriority, TaskStatus,
};
use crate::store::traits::Database;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'active',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_projects_status ON projects(status);

    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'todo',
        priority TEXT NOT NULL DEFAULT 'medium',
        created_at TEXT NOT NULL,
        completed_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
    CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);

    CREATE TABLE IF NOT EXISTS sessions (
        session_id TEXT PRIMARY KEY,
        agent_name TEXT NOT NULL,
        messages TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL,
        last_active TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_sessions_last_active ON sessions(last_active);
"#;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and initialize the schema.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn init_schema(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(SCHEMA)
            .await
            .map_err(|e| DatabaseError::Query(format!("init_schema: {e}")))?;
        Ok(())
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 datetime string, falling back to the epoch floor.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn parse_optional_datetime(s: &Option<String>) -> Option<DateTime<Utc>> {
    s.as_ref().map(|s| parse_datetime(s))
}

fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_else(|_| Uuid::nil())
}

/// Convert `Option<String>` to a libsql Value.
fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

fn row_to_project(row: &libsql::Row) -> Result<Project, libsql::Error> {
    let id_str: String = row.get(0)?;
    let status_str: String = row.get(3)?;
    let created_str: String = row.get(4)?;
    let updated_str: String = row.get(5)?;

    Ok(Project {
        id: parse_uuid(&id_str),
        name: row.get(1)?,
        description: row.get(2)?,
        status: ProjectStatus::from_db(&status_str),
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

fn row_to_task(row: &libsql::Row) -> Result<Task, libsql::Error> {
    let id_str: String = row.get(0)?;
    let project_str: String = row.get(1)?;
    let status_str: String = row.get(4)?;
    let priority_str: String = row.get(5)?;
    let created_str: String = row.get(6)?;
    let completed_str: Option<String> = row.get(7).ok();

    Ok(Task {
        id: parse_uuid(&id_str),
        project_id: parse_uuid(&project_str),
        title: row.get(2)?,
        description: row.get(3)?,
        status: TaskStatus::from_db(&status_str),
        priority: TaskPriority::from_db(&priority_str),
        created_at: parse_datetime(&created_str),
        completed_at: parse_optional_datetime(&completed_str),
    })
}

fn row_to_session(row: &libsql::Row) -> Result<Session, DatabaseError> {
    let session_id: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("session row: {e}")))?;
    let agent_name: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("session row: {e}")))?;
    let messages_json: String = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("session row: {e}")))?;
    let created_str: String = row
        .get(3)
        .map_err(|e| DatabaseError::Query(format!("session row: {e}")))?;
    let last_active_str: String = row
        .get(4)
        .map_err(|e| DatabaseError::Query(format!("session row: {e}")))?;

    let messages = serde_json::from_str(&messages_json)
        .map_err(|e| DatabaseError::Serialization(format!("session turn log: {e}")))?;

    Ok(Session {
        session_id,
        agent_name,
        messages,
        created_at: parse_datetime(&created_str),
        last_active: parse_datetime(&last_active_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const PROJECT_COLUMNS: &str = "id, name, description, status, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, project_id, title, description, status, priority, created_at, completed_at";
const SESSION_COLUMNS: &str = "session_id, agent_name, messages, created_at, last_active";

#[async_trait]
impl Database for LibSqlBackend {
    async fn insert_project(&self, project: &Project) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO projects (id, name, description, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    project.id.to_string(),
                    project.name.clone(),
                    project.description.clone(),
                    project.status.as_str(),
                    project.created_at.to_rfc3339(),
                    project.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_project: {e}")))?;
        debug!(project = %project.name, "Project inserted");
        Ok(())
    }

    async fn get_project_by_name(&self, name: &str) -> Result<Option<Project>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE name = ?1"),
                params![name],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_project_by_name: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_project(&row).map_err(|e| {
                DatabaseError::Query(format!("get_project_by_name row: {e}"))
            })?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_project_by_name: {e}"))),
        }
    }

    async fn get_project_by_name_ci(&self, name: &str) -> Result<Option<Project>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects WHERE lower(name) = lower(?1)"
                ),
                params![name],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_project_by_name_ci: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_project(&row).map_err(|e| {
                DatabaseError::Query(format!("get_project_by_name_ci row: {e}"))
            })?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_project_by_name_ci: {e}"))),
        }
    }

    async fn list_active_projects(&self, limit: usize) -> Result<Vec<Project>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects WHERE status = 'active'
                     ORDER BY created_at ASC LIMIT ?1"
                ),
                params![limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_active_projects: {e}")))?;

        let mut projects = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            projects.push(
                row_to_project(&row)
                    .map_err(|e| DatabaseError::Query(format!("list_active_projects row: {e}")))?,
            );
        }
        Ok(projects)
    }

    async fn delete_project(&self, id: Uuid) -> Result<(), DatabaseError> {
        let conn = self.conn();
        conn.execute(
            "DELETE FROM tasks WHERE project_id = ?1",
            params![id.to_string()],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("delete_project tasks: {e}")))?;
        conn.execute("DELETE FROM projects WHERE id = ?1", params![id.to_string()])
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_project: {e}")))?;
        debug!(project_id = %id, "Project deleted");
        Ok(())
    }

    async fn insert_task(&self, task: &Task) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO tasks (id, project_id, title, description, status, priority,
                    created_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    task.id.to_string(),
                    task.project_id.to_string(),
                    task.title.clone(),
                    task.description.clone(),
                    task.status.as_str(),
                    task.priority.as_str(),
                    task.created_at.to_rfc3339(),
                    opt_text_owned(task.completed_at.map(|t| t.to_rfc3339())),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_task: {e}")))?;
        debug!(task = %task.title, "Task inserted");
        Ok(())
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_task: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_task(&row).map_err(|e| {
                DatabaseError::Query(format!("get_task row: {e}"))
            })?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_task: {e}"))),
        }
    }

    async fn get_task_by_title_ci(&self, title: &str) -> Result<Option<Task>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {TASK_COLUMNS} FROM tasks WHERE lower(title) = lower(?1)
                     ORDER BY created_at DESC LIMIT 1"
                ),
                params![title],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_task_by_title_ci: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_task(&row).map_err(|e| {
                DatabaseError::Query(format!("get_task_by_title_ci row: {e}"))
            })?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_task_by_title_ci: {e}"))),
        }
    }

    async fn list_tasks(&self, project_id: Option<Uuid>) -> Result<Vec<Task>, DatabaseError> {
        let mut rows = match project_id {
            Some(pid) => self
                .conn()
                .query(
                    &format!(
                        "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ?1
                         ORDER BY created_at DESC"
                    ),
                    params![pid.to_string()],
                )
                .await,
            None => self
                .conn()
                .query(
                    &format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC"),
                    (),
                )
                .await,
        }
        .map_err(|e| DatabaseError::Query(format!("list_tasks: {e}")))?;

        let mut tasks = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            tasks.push(
                row_to_task(&row)
                    .map_err(|e| DatabaseError::Query(format!("list_tasks row: {e}")))?,
            );
        }
        Ok(tasks)
    }

    async fn list_pending_tasks(&self, limit: usize) -> Result<Vec<Task>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {TASK_COLUMNS} FROM tasks WHERE status != 'done'
                     ORDER BY created_at DESC LIMIT ?1"
                ),
                params![limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_pending_tasks: {e}")))?;

        let mut tasks = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            tasks.push(
                row_to_task(&row)
                    .map_err(|e| DatabaseError::Query(format!("list_pending_tasks row: {e}")))?,
            );
        }
        // Most urgent first within the window.
        tasks.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));
        Ok(tasks)
    }

    async fn update_task_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "UPDATE tasks SET status = ?1, completed_at = ?2 WHERE id = ?3",
                params![
                    status.as_str(),
                    opt_text_owned(completed_at.map(|t| t.to_rfc3339())),
                    id.to_string(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_task_status: {e}")))?;
        debug!(task_id = %id, status = status.as_str(), "Task status updated");
        Ok(())
    }

    async fn load_session(&self, session_id: &str) -> Result<Option<Session>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = ?1"),
                params![session_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("load_session: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_session(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("load_session: {e}"))),
        }
    }

    async fn save_session(&self, session: &Session) -> Result<(), DatabaseError> {
        let messages_json = serde_json::to_string(&session.messages)
            .map_err(|e| DatabaseError::Serialization(format!("session turn log: {e}")))?;

        self.conn()
            .execute(
                "INSERT INTO sessions (session_id, agent_name, messages, created_at, last_active)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(session_id) DO UPDATE SET
                    agent_name = excluded.agent_name,
                    messages = excluded.messages,
                    last_active = excluded.last_active",
                params![
                    session.session_id.clone(),
                    session.agent_name.clone(),
                    messages_json,
                    session.created_at.to_rfc3339(),
                    session.last_active.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_session: {e}")))?;
        debug!(session_id = %session.session_id, turns = session.messages.len(), "Session saved");
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY last_active DESC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_sessions: {e}")))?;

        let mut sessions = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            sessions.push(row_to_session(&row)?);
        }
        Ok(sessions)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::Turn;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    #[tokio::test]
    async fn project_insert_and_lookup() {
        let db = test_db().await;
        let project = Project::new("Apollo", "lunar things");
        db.insert_project(&project).await.unwrap();

        let exact = db.get_project_by_name("Apollo").await.unwrap();
        assert!(exact.is_some());

        assert!(db.get_project_by_name("apollo").await.unwrap().is_none());
        let ci = db.get_project_by_name_ci("APOLLO").await.unwrap().unwrap();
        assert_eq!(ci.id, project.id);
    }

    #[tokio::test]
    async fn duplicate_project_name_rejected() {
        let db = test_db().await;
        db.insert_project(&Project::new("Apollo", "")).await.unwrap();
        let result = db.insert_project(&Project::new("Apollo", "again")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn delete_project_removes_its_tasks() {
        let db = test_db().await;
        let project = Project::new("Apollo", "");
        db.insert_project(&project).await.unwrap();
        db.insert_task(&Task::new(project.id, "t1", "", TaskPriority::Low))
            .await
            .unwrap();

        db.delete_project(project.id).await.unwrap();
        assert!(db.list_tasks(Some(project.id)).await.unwrap().is_empty());
        assert!(db.get_project_by_name("Apollo").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn task_status_update_and_pending_list() {
        let db = test_db().await;
        let project = Project::new("Apollo", "");
        db.insert_project(&project).await.unwrap();

        let t1 = Task::new(project.id, "low prio", "", TaskPriority::Low);
        let t2 = Task::new(project.id, "hot fix", "", TaskPriority::Critical);
        db.insert_task(&t1).await.unwrap();
        db.insert_task(&t2).await.unwrap();

        db.update_task_status(t1.id, TaskStatus::Done, Some(Utc::now()))
            .await
            .unwrap();

        let pending = db.list_pending_tasks(20).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "hot fix");

        let by_title = db.get_task_by_title_ci("HOT FIX").await.unwrap().unwrap();
        assert_eq!(by_title.id, t2.id);
    }

    #[tokio::test]
    async fn session_round_trip_preserves_turn_order() {
        let db = test_db().await;
        let before = Utc::now();

        let mut session = Session::new("sess-1", "aide");
        session.push(Turn::user("hello"));
        session.push(Turn::assistant("hi there", "ASSISTANT"));
        session.touch();
        db.save_session(&session).await.unwrap();

        let loaded = db.load_session("sess-1").await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.messages[0].content, "hello");
        assert_eq!(loaded.messages[1].agent.as_deref(), Some("ASSISTANT"));
        assert!(loaded.last_active >= before);

        // Upsert: appending and re-saving keeps one row.
        let mut again = loaded;
        again.push(Turn::user("more"));
        again.touch();
        db.save_session(&again).await.unwrap();

        let sessions = db.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].messages.len(), 3);
    }

    #[tokio::test]
    async fn load_missing_session_is_none() {
        let db = test_db().await;
        assert!(db.load_session("nope").await.unwrap().is_none());
    }
}
