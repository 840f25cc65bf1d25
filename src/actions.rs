//! Action extraction — the fine-grained intent within a routed handler.
//!
//! No inference call here: per-handler tables of keyword groups are tested
//! in a fixed priority order (query intent before mutation, mutation before
//! deletion) and the first matching group wins. Matching is case-insensitive
//! substring containment over the raw message — no tokenizer, no stemming.
//! The function is total: every (message, handler) pair yields exactly one
//! action.

use crate::router::HandlerKind;

/// The universal fallback action.
pub const FALLBACK_ACTION: &str = "query";

/// One priority slot: the first keyword hit claims the action.
#[derive(Debug, Clone, Copy)]
pub struct ActionRule {
    pub action: &'static str,
    pub keywords: &'static [&'static str],
}

const PLANNER_RULES: &[ActionRule] = &[
    ActionRule {
        action: "list_tasks",
        keywords: &["list tasks", "show tasks", "my tasks", "what tasks", "pending tasks"],
    },
    ActionRule {
        action: "break_down_goal",
        keywords: &["break down", "breakdown", "split", "subtask"],
    },
    ActionRule {
        action: "detect_blockers",
        keywords: &["blocker", "blocked", "stuck"],
    },
    ActionRule {
        action: "sync_issues",
        keywords: &["github", "repo", "issue", "commit"],
    },
    ActionRule {
        action: "export_notes",
        keywords: &["notion", "export", "save to notes"],
    },
    ActionRule {
        action: "create_task",
        keywords: &["create a task", "add a task", "add task", "new task", "task to"],
    },
    ActionRule {
        action: "create_project",
        keywords: &["create a project", "new project", "start a project"],
    },
    ActionRule {
        action: "update_status",
        keywords: &["mark ", "set status", "move to", "finish", "complete", "done with"],
    },
    ActionRule {
        action: "delete_project",
        keywords: &["delete project", "delete the project", "remove project", "drop project"],
    },
];

const SCHOLAR_RULES: &[ActionRule] = &[
    ActionRule {
        action: "learning_path",
        keywords: &["learning path", "how to learn", "study plan", "roadmap"],
    },
    ActionRule {
        action: "summarize",
        keywords: &["summarize", "summary of", "tldr"],
    },
    ActionRule {
        action: "ingest",
        keywords: &["ingest", "add to knowledge", "remember this", "save this"],
    },
];

const MENTOR_RULES: &[ActionRule] = &[
    ActionRule {
        action: "skill_gap",
        keywords: &["skill gap", "skills i need", "what skills"],
    },
    ActionRule {
        action: "weekly_checkin",
        keywords: &["weekly check", "check in", "progress review"],
    },
    ActionRule {
        action: "job_analysis",
        keywords: &["job", "posting", "jd ", "job description"],
    },
    ActionRule {
        action: "resume_review",
        keywords: &["resume", "cv ", "portfolio"],
    },
    ActionRule {
        action: "goal_tracking",
        keywords: &["goal", "goals", "track", "progress"],
    },
];

const CODER_RULES: &[ActionRule] = &[
    ActionRule {
        action: "review",
        keywords: &["review", "check this code", "look at this"],
    },
    ActionRule {
        action: "debug",
        keywords: &["error", "bug", "exception", "traceback", "fails", "crash"],
    },
    ActionRule {
        action: "architecture",
        keywords: &["architecture", "design", "structure", "system design"],
    },
    ActionRule {
        action: "refactor",
        keywords: &["refactor", "clean up", "improve this code"],
    },
    ActionRule {
        action: "boilerplate",
        keywords: &["boilerplate", "template", "generate", "scaffold"],
    },
    ActionRule {
        action: "tech_decision",
        keywords: &["vs ", "versus", "choose between", "which is better"],
    },
];

/// The ordered rule table for a handler. The catch-all has none — it always
/// gets the fallback.
pub fn rules_for(handler: HandlerKind) -> &'static [ActionRule] {
    match handler {
        HandlerKind::Planner => PLANNER_RULES,
        HandlerKind::Scholar => SCHOLAR_RULES,
        HandlerKind::Mentor => MENTOR_RULES,
        HandlerKind::Coder => CODER_RULES,
        HandlerKind::Assistant => &[],
    }
}

/// Infer the action for a message within its routed handler.
pub fn extract_action(message: &str, handler: HandlerKind) -> &'static str {
    let msg = message.to_lowercase();
    rules_for(handler)
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| msg.contains(k)))
        .map(|rule| rule.action)
        .unwrap_or(FALLBACK_ACTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pair_yields_exactly_one_action() {
        let messages = ["", "hello", "ERROR in refactor", "🤖", "break down my goals"];
        for handler in HandlerKind::ALL {
            for message in messages {
                let first = extract_action(message, handler);
                let second = extract_action(message, handler);
                assert_eq!(first, second);
                assert!(!first.is_empty());
            }
        }
    }

    #[test]
    fn higher_priority_group_wins() {
        // "error" (debug) and "refactor" (refactor) both match; debug is the
        // higher-priority group.
        let action = extract_action(
            "there is an ERROR after my refactor, help",
            HandlerKind::Coder,
        );
        assert_eq!(action, "debug");
    }

    #[test]
    fn review_outranks_debug() {
        let action = extract_action("review this code, it has a bug", HandlerKind::Coder);
        assert_eq!(action, "review");
    }

    #[test]
    fn planner_query_intent_before_mutation() {
        let action = extract_action("list tasks and add a task", HandlerKind::Planner);
        assert_eq!(action, "list_tasks");
    }

    #[test]
    fn planner_task_creation() {
        let action = extract_action(
            "create a task to fix the login bug in ProjectX, priority high",
            HandlerKind::Planner,
        );
        assert_eq!(action, "create_task");
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(
            extract_action("BREAK DOWN this goal", HandlerKind::Planner),
            "break_down_goal"
        );
    }

    #[test]
    fn no_match_falls_back_to_query() {
        assert_eq!(extract_action("tell me a story", HandlerKind::Coder), FALLBACK_ACTION);
        assert_eq!(extract_action("what should I do", HandlerKind::Scholar), FALLBACK_ACTION);
    }

    #[test]
    fn catch_all_always_falls_back() {
        assert_eq!(
            extract_action("create a task for me", HandlerKind::Assistant),
            FALLBACK_ACTION
        );
    }
}
