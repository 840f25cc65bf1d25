//! Planner — the operational handler.
//!
//! Owns everything project/task shaped: tool-backed mutations, goal
//! breakdowns, blocker detection, issue-tracker sync, and note export.
//!
//! Tool-backed actions go through an explicit pre-tool normalization step:
//! the gateway turns free text into structured JSON fields, and only then is
//! the deterministic tool invoked. Fuzzy matching of project names happens
//! here, never inside a tool.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{HandlerError, ToolError};
use crate::handlers::{AgentReply, Handler, HandlerInput, context_project_names, context_text};
use crate::integrations::Integrations;
use crate::llm::{Gateway, TaskHint};
use crate::mcp::McpRegistry;
use crate::router::HandlerKind;

const PLANNER_SYSTEM: &str = "\
You are the planning handler of a personal assistant. You manage the user's \
projects and tasks with precision and honesty.

Your job:
- Break goals into concrete, completable tasks, never vague items
- Detect and name blockers explicitly
- Push toward shipping, not perfecting
- When the user is overbuilding, say so and name what to finish first
- Format: structured bullets; DONE for done, BLOCKED for blocked, WIP for in-progress";

const BREAKDOWN_PROMPT: &str = "\
Break down this goal into concrete tasks.

Goal: {goal}
Active projects:
{projects}

Rules:
- Each task completable in 1-3 hours max
- Tasks in correct dependency order
- Include testing/verification steps
- Flag tasks needing external input

Format each task: - [ ] Task title (Xh) | Priority: HIGH/MED/LOW

Max 8 tasks. If more are needed, say so.";

const BLOCKER_PROMPT: &str = "\
Analyze these tasks and identify blockers.

Tasks:
{tasks}

User message: {message}

Identify:
1. HARD BLOCKERS - cannot proceed
2. SOFT BLOCKERS - slowed but can continue
3. DEPENDENCIES - waiting on other tasks
4. RECOMMENDATIONS - how to unblock each";

/// JSON shape the normalization step must produce, per action.
fn normalization_shape(action: &str) -> &'static str {
    match action {
        "create_task" => {
            r#"{"project": "<matching known project, or General>", "title": "<short task title>", "description": "<details, or empty>", "priority": "low|medium|high|critical"}"#
        }
        "create_project" => r#"{"name": "<project name>", "description": "<description, or empty>"}"#,
        "update_status" => {
            r#"{"title": "<task title, or empty>", "status": "todo|in_progress|blocked|done", "all": <true only if every task is meant>, "project": "<project name, or empty>"}"#
        }
        "delete_project" => r#"{"name": "<project name>"}"#,
        "list_tasks" => r#"{"project": "<project name, or empty for all>"}"#,
        "sync_issues" => r#"{"repo": "<repository name, or empty>"}"#,
        _ => "{}",
    }
}

/// Pull the first JSON object out of a model response, tolerating prose and
/// code fences around it.
fn parse_json_object(text: &str) -> Result<serde_json::Value, HandlerError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let (Some(start), Some(end)) = (start, end) else {
        return Err(HandlerError::Normalization(format!(
            "expected a JSON object, got: {}",
            text.chars().take(80).collect::<String>()
        )));
    };
    serde_json::from_str(&text[start..=end])
        .map_err(|e| HandlerError::Normalization(format!("invalid JSON: {e}")))
}

pub struct PlannerHandler {
    gateway: Arc<Gateway>,
    registry: Arc<McpRegistry>,
    integrations: Arc<Integrations>,
}

impl PlannerHandler {
    pub fn new(
        gateway: Arc<Gateway>,
        registry: Arc<McpRegistry>,
        integrations: Arc<Integrations>,
    ) -> Self {
        Self {
            gateway,
            registry,
            integrations,
        }
    }

    /// Normalize free text into the structured fields a tool expects.
    async fn normalize(
        &self,
        message: &str,
        action: &'static str,
        project_names: &[String],
    ) -> Result<serde_json::Value, HandlerError> {
        let prompt = format!(
            "Extract structured fields from this request.\n\
             \n\
             Request: \"{message}\"\n\
             Known projects: {projects}\n\
             \n\
             Reply with ONLY a JSON object in exactly this shape, no prose:\n\
             {shape}\n\
             \n\
             Match project names against the known projects when possible.",
            projects = if project_names.is_empty() {
                "(none)".to_string()
            } else {
                project_names.join(", ")
            },
            shape = normalization_shape(action),
        );

        let response = self
            .gateway
            .complete(&prompt, None, TaskHint::Budget, None)
            .await?;
        let fields = parse_json_object(&response)?;
        debug!(action, ?fields, "Normalized tool arguments");
        Ok(fields)
    }

    /// Invoke a registry tool and surface its result as a reply. Successful
    /// mutations also go out as a push notification, best-effort.
    async fn run_tool(
        &self,
        tool_name: &str,
        action: &str,
        args: &serde_json::Value,
    ) -> Result<AgentReply, HandlerError> {
        let tool = self
            .registry
            .tool(tool_name)
            .ok_or_else(|| ToolError::NotFound {
                name: tool_name.to_string(),
            })?;

        let result = tool.run(action, args).await;
        if result.success {
            if action != "list" {
                self.notify(&result.output).await;
            }
            Ok(AgentReply::ok(HandlerKind::Planner, result.output))
        } else {
            Ok(AgentReply::failure(HandlerKind::Planner, result.output))
        }
    }

    /// Best-effort push notification for completed mutations.
    async fn notify(&self, text: &str) {
        if !self.integrations.telegram.is_configured() {
            return;
        }
        if let Err(e) = self.integrations.telegram.push_message(text).await {
            warn!(error = %e, "Telegram push failed");
        }
    }

    async fn sync_issues(&self, repo: &str) -> AgentReply {
        let github = &self.integrations.github;
        if !github.is_configured() {
            return AgentReply::failure(
                HandlerKind::Planner,
                "GitHub not configured. Set GITHUB_TOKEN and GITHUB_USERNAME.",
            );
        }

        if repo.is_empty() {
            return match github.list_repos(10).await {
                Ok(repos) => {
                    let lines: Vec<String> = repos
                        .iter()
                        .map(|r| format!("- {} ({} open issues)", r.name, r.open_issues))
                        .collect();
                    AgentReply::ok(
                        HandlerKind::Planner,
                        format!(
                            "Your repositories:\n{}\n\nName one to see its open issues.",
                            lines.join("\n")
                        ),
                    )
                }
                Err(e) => {
                    AgentReply::failure(HandlerKind::Planner, format!("Issue sync error: {e}"))
                }
            };
        }

        match github.project_summary(repo).await {
            Ok((summary, issues)) => {
                let mut output = format!(
                    "{} — {}\nOpen issues: {}\n",
                    summary.name,
                    summary.description.unwrap_or_default(),
                    summary.open_issues
                );
                if !issues.is_empty() {
                    output.push_str("\nTop issues:\n");
                    for issue in &issues {
                        output.push_str(&format!("- #{}: {}\n", issue.number, issue.title));
                    }
                }
                AgentReply::ok(HandlerKind::Planner, output)
            }
            Err(e) => AgentReply::failure(HandlerKind::Planner, format!("Issue sync error: {e}")),
        }
    }

    async fn export_notes(&self, message: &str) -> AgentReply {
        let notion = &self.integrations.notion;
        if !notion.is_configured() {
            return AgentReply::failure(
                HandlerKind::Planner,
                "Note export not configured. Set NOTION_API_KEY.",
            );
        }
        let Some(database_id) = notion.default_database() else {
            return AgentReply::failure(
                HandlerKind::Planner,
                "No note database configured. Set NOTION_DAILY_LOG_DB.",
            );
        };

        let title = format!("Note — {}", chrono::Utc::now().format("%Y-%m-%d"));
        match notion.create_note(database_id, &title, message).await {
            Ok(url) => AgentReply::ok(HandlerKind::Planner, format!("Exported note: {url}")),
            Err(e) => {
                AgentReply::failure(HandlerKind::Planner, format!("Note export failed: {e}"))
            }
        }
    }

    async fn break_down_goal(&self, input: &HandlerInput) -> Result<AgentReply, HandlerError> {
        let prompt = BREAKDOWN_PROMPT
            .replace("{goal}", &input.message)
            .replace(
                "{projects}",
                context_text(&input.context, "projects", "No active projects found."),
            );
        let response = self
            .gateway
            .complete(&prompt, Some(PLANNER_SYSTEM), TaskHint::DeepReasoning, None)
            .await?;
        Ok(AgentReply::ok(HandlerKind::Planner, response))
    }

    async fn detect_blockers(&self, input: &HandlerInput) -> Result<AgentReply, HandlerError> {
        let prompt = BLOCKER_PROMPT
            .replace(
                "{tasks}",
                context_text(&input.context, "tasks", "No pending tasks."),
            )
            .replace("{message}", &input.message);
        let response = self
            .gateway
            .complete(&prompt, Some(PLANNER_SYSTEM), TaskHint::DeepReasoning, None)
            .await?;
        Ok(AgentReply::ok(HandlerKind::Planner, response))
    }

    async fn query(&self, input: &HandlerInput) -> Result<AgentReply, HandlerError> {
        let system = format!(
            "{PLANNER_SYSTEM}\n\nActive projects:\n{}\n\nPending tasks:\n{}",
            context_text(&input.context, "projects", "No active projects found."),
            context_text(&input.context, "tasks", "No pending tasks."),
        );
        let response = self
            .gateway
            .complete(&input.message, Some(&system), TaskHint::General, None)
            .await?;
        Ok(AgentReply::ok(HandlerKind::Planner, response))
    }
}

#[async_trait]
impl Handler for PlannerHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Planner
    }

    async fn handle(&self, input: &HandlerInput) -> Result<AgentReply, HandlerError> {
        let project_names = context_project_names(&input.context);

        match input.action {
            "create_task" => {
                let args = self
                    .normalize(&input.message, input.action, &project_names)
                    .await?;
                self.run_tool("tasks", "create", &args).await
            }
            "create_project" => {
                let args = self
                    .normalize(&input.message, input.action, &project_names)
                    .await?;
                self.run_tool("projects", "create", &args).await
            }
            "update_status" => {
                let args = self
                    .normalize(&input.message, input.action, &project_names)
                    .await?;
                let bulk = args.get("all").and_then(|v| v.as_bool()).unwrap_or(false);
                let tool_action = if bulk { "update_all" } else { "update_status" };
                self.run_tool("tasks", tool_action, &args).await
            }
            "delete_project" => {
                let args = self
                    .normalize(&input.message, input.action, &project_names)
                    .await?;
                self.run_tool("projects", "delete", &args).await
            }
            "list_tasks" => {
                let args = self
                    .normalize(&input.message, input.action, &project_names)
                    .await?;
                // Empty project means "all tasks" — drop the filter.
                let args = match args.get("project").and_then(|v| v.as_str()) {
                    Some(project) if !project.is_empty() => {
                        serde_json::json!({"project": project})
                    }
                    _ => serde_json::json!({}),
                };
                self.run_tool("tasks", "list", &args).await
            }
            "sync_issues" => {
                let repo = self
                    .normalize(&input.message, input.action, &project_names)
                    .await
                    .ok()
                    .and_then(|args| {
                        args.get("repo").and_then(|v| v.as_str()).map(str::to_string)
                    })
                    .unwrap_or_default();
                Ok(self.sync_issues(&repo).await)
            }
            "export_notes" => Ok(self.export_notes(&input.message).await),
            "break_down_goal" => self.break_down_goal(input).await,
            "detect_blockers" => self.detect_blockers(input).await,
            _ => self.query(input).await,
        }
    }
}
