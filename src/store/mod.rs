//! Persistence: domain records (projects, tasks) and conversation sessions.

pub mod libsql_backend;
pub mod models;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use models::{Project, ProjectStatus, Role, Session, Task, TaskPriority, TaskStatus, Turn};
pub use traits::Database;
