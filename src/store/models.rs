//! Domain and session models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Projects ────────────────────────────────────────────────────────

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Paused,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Parse a DB string, defaulting unknown values to `Active`.
    pub fn from_db(s: &str) -> Self {
        match s {
            "paused" => Self::Paused,
            "completed" => Self::Completed,
            "archived" => Self::Archived,
            _ => Self::Active,
        }
    }
}

/// A project record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            status: ProjectStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

// ── Tasks ───────────────────────────────────────────────────────────

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Blocked,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Done => "done",
        }
    }

    /// Strict parse for user-supplied status strings. Returns `None` for
    /// anything outside the vocabulary — tools turn that into an explicit
    /// failure rather than guessing.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "blocked" => Some(Self::Blocked),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    /// Lenient parse for DB rows.
    pub fn from_db(s: &str) -> Self {
        Self::parse(s).unwrap_or(Self::Todo)
    }
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parse a user-supplied priority, defaulting to `Medium`.
    pub fn parse_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Medium,
        }
    }

    pub fn from_db(s: &str) -> Self {
        Self::parse_or_default(s)
    }

    /// Sort rank — higher is more urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Critical => 3,
        }
    }
}

/// A task record, always attached to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        project_id: Uuid,
        title: impl Into<String>,
        description: impl Into<String>,
        priority: TaskPriority,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Todo,
            priority,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

// ── Sessions ────────────────────────────────────────────────────────

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Which handler produced an assistant turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            agent: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            agent: Some(agent.into()),
            timestamp: Utc::now(),
        }
    }
}

/// A durable conversation: an append-only turn log keyed by an opaque id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub agent_name: String,
    pub messages: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    pub fn new(session_id: impl Into<String>, agent_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            agent_name: agent_name.into(),
            messages: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    /// Append a turn. Turns are only ever appended, never reordered.
    pub fn push(&mut self, turn: Turn) {
        self.messages.push(turn);
    }

    /// Bump `last_active`, keeping it monotonically non-decreasing.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.last_active {
            self.last_active = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_strict_parse() {
        assert_eq!(TaskStatus::parse("in_progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("DONE"), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::parse("finished"), None);
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(TaskPriority::parse_or_default("urgent"), TaskPriority::Medium);
        assert_eq!(TaskPriority::parse_or_default("HIGH"), TaskPriority::High);
        assert!(TaskPriority::Critical.rank() > TaskPriority::High.rank());
    }

    #[test]
    fn session_touch_is_monotonic() {
        let mut session = Session::new("s1", "aide");
        let before = session.last_active;
        session.touch();
        assert!(session.last_active >= before);
    }

    #[test]
    fn turn_serde_round_trip() {
        let turn = Turn::assistant("done", "PLANNER");
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("\"assistant\""));
        let back: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(back.agent.as_deref(), Some("PLANNER"));
    }
}
