//! Prompt formatters — fold a context bundle into a persona system prompt.

use crate::mcp::{ContextBundle, PromptFormatter};
use crate::store::{Role, Turn};

/// Placeholder used when a bundle slot is missing or structured.
const NONE_FOUND: &str = "none found";

/// Render a bounded window of recent turns as role-prefixed lines, oldest
/// first. Empty history gets an explicit placeholder.
pub fn format_history(turns: &[Turn], window: usize) -> String {
    if turns.is_empty() {
        return "No previous conversation.".to_string();
    }

    let start = turns.len().saturating_sub(window);
    turns[start..]
        .iter()
        .map(|turn| {
            let role = match turn.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{role}: {}", turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pull a text slot out of the bundle, degrading to the placeholder when the
/// key is missing or the value is not plain text.
fn text_slot<'a>(bundle: &'a ContextBundle, key: &str) -> &'a str {
    bundle
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(NONE_FOUND)
}

/// The general-conversation persona prompt.
///
/// Substitutes the projects summary, the recent-history window, and the
/// static persona/policy text; a time slot is appended when present.
pub struct AssistantFormatter;

impl PromptFormatter for AssistantFormatter {
    fn name(&self) -> &str {
        "assistant_system_prompt"
    }

    fn format(&self, bundle: &ContextBundle, history: Option<&str>) -> String {
        let projects = text_slot(bundle, "projects");
        let history = history.unwrap_or("No previous conversation.");

        let mut prompt = format!(
            "You are the user's personal assistant — sharp, direct, and strategic.\n\
             \n\
             CONTEXT\n\
             - Active projects:\n{projects}\n\
             - Recent conversation:\n{history}\n\
             \n\
             You coordinate specialized capabilities:\n\
             - PLANNER: projects, tasks, deadlines, issue sync, note export\n\
             - SCHOLAR: research, summaries, learning paths\n\
             - MENTOR: career strategy, skill gaps, growth planning\n\
             - CODER: code review, debugging, architecture\n\
             Do not mention internal routing unless explicitly asked.\n\
             \n\
             RESPONSE RULES\n\
             - Markdown, with headers and bullet lists where they add clarity\n\
             - Code blocks with language tags\n\
             - Direct and honest, even when uncomfortable\n\
             - Reference the user's actual projects when relevant\n\
             - When unclear, ask one high-leverage clarifying question\n"
        );

        if let Some(time) = bundle.get("time").and_then(|v| v.as_str()) {
            prompt.push('\n');
            prompt.push_str(time);
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_slots_degrade_to_placeholder() {
        let bundle = ContextBundle::new();
        let prompt = AssistantFormatter.format(&bundle, None);
        assert!(prompt.contains("none found"));
        assert!(prompt.contains("No previous conversation."));
    }

    #[test]
    fn slots_are_substituted() {
        let mut bundle = ContextBundle::new();
        bundle.insert(
            "projects".into(),
            serde_json::json!("- Apollo: moon shot"),
        );
        bundle.insert("time".into(), serde_json::json!("[Time: 2024-01-01 09:00]"));

        let prompt = AssistantFormatter.format(&bundle, Some("User: hi"));
        assert!(prompt.contains("- Apollo: moon shot"));
        assert!(prompt.contains("User: hi"));
        assert!(prompt.ends_with("[Time: 2024-01-01 09:00]"));
    }

    #[test]
    fn history_window_is_bounded() {
        let turns: Vec<Turn> = (0..20).map(|i| Turn::user(format!("msg {i}"))).collect();
        let history = format_history(&turns, 12);
        assert!(!history.contains("msg 7"));
        assert!(history.contains("msg 8"));
        assert!(history.contains("msg 19"));
        // Oldest of the window comes first.
        assert!(history.starts_with("User: msg 8"));
    }

    #[test]
    fn empty_history_placeholder() {
        assert_eq!(format_history(&[], 12), "No previous conversation.");
    }

    #[test]
    fn structured_slot_is_not_spliced_raw() {
        let mut bundle = ContextBundle::new();
        bundle.insert("projects".into(), serde_json::json!(["Apollo"]));
        let prompt = AssistantFormatter.format(&bundle, None);
        assert!(prompt.contains("none found"));
    }
}
