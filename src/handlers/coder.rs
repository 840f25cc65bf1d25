//! Coder — code review, debugging, architecture, refactoring.
//!
//! Every action is a prompt template over the message; the heavy lifting is
//! delegated to the gateway with a coding task hint.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::handlers::{AgentReply, Handler, HandlerInput};
use crate::llm::{Gateway, TaskHint};
use crate::router::HandlerKind;

const CODER_SYSTEM: &str = "\
You are the code handler of a personal assistant.

Your rules:
- Never suggest solutions that break the existing architecture
- Always explain the WHY, not just the WHAT
- Prefer simple solutions that can be extended over complex ones that can't
- Call out bad patterns directly
- Format: code blocks with language tags, inline comments for key decisions
- If the problem is architectural, say so instead of patching bad foundations";

const REVIEW_PROMPT: &str = "\
Review the code in this request.

Request:
{message}

Review for:
1. BUGS - actual errors or likely runtime failures
2. PERFORMANCE - bottlenecks, unnecessary work, memory issues
3. ARCHITECTURE - does this fit well in a larger system?
4. QUICK WINS - top 3 changes with highest impact

Then provide the IMPROVED VERSION with inline comments explaining changes.";

const DEBUG_PROMPT: &str = "\
Debug the problem in this request.

Request:
{message}

Provide:
1. ROOT CAUSE - exactly what went wrong and why
2. FIX - corrected code with explanation
3. PREVENTION - how to avoid this class of error in future
4. RELATED ISSUES - any other problems you see nearby";

const ARCHITECTURE_PROMPT: &str = "\
Review the architecture described in this request and give honest feedback.

Request:
{message}

Analyze:
1. STRENGTHS - what's well designed
2. WEAKNESSES - real problems, not nitpicks
3. SCALABILITY - will it hold up? Where does it break?
4. MISSING PIECES - what's not there that should be
5. SPECIFIC RECOMMENDATIONS - ranked by priority

Be an architect, not a code reviewer.";

const REFACTOR_PROMPT: &str = "\
Refactor the code in this request.

Request:
{message}

Constraints:
- Must maintain the existing API/interface

Provide:
1. REFACTORED CODE - clean, production-ready
2. CHANGES MADE - bulleted list of what changed and why
3. MIGRATION NOTES - anything caller code needs to update";

const BOILERPLATE_PROMPT: &str = "\
Generate production-ready boilerplate for this request.

Request:
{message}

Generate complete, working code with:
- Proper error handling
- Types where the language has them
- Inline comments for non-obvious decisions";

const TECH_DECISION_PROMPT: &str = "\
Help decide between the technical options in this request.

Request:
{message}

Provide:
1. THE TRADE-OFFS that actually matter here
2. RECOMMENDATION - one option, with the reason
3. WHEN THE OTHER OPTION WINS - the conditions that would flip the answer";

pub struct CoderHandler {
    gateway: Arc<Gateway>,
}

impl CoderHandler {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    fn template_for(action: &str) -> (&'static str, TaskHint) {
        match action {
            "review" => (REVIEW_PROMPT, TaskHint::CodeReviewDeep),
            "debug" => (DEBUG_PROMPT, TaskHint::Coding),
            "architecture" => (ARCHITECTURE_PROMPT, TaskHint::DeepReasoning),
            "refactor" => (REFACTOR_PROMPT, TaskHint::Coding),
            "boilerplate" => (BOILERPLATE_PROMPT, TaskHint::Coding),
            "tech_decision" => (TECH_DECISION_PROMPT, TaskHint::DeepReasoning),
            _ => ("{message}", TaskHint::Coding),
        }
    }
}

#[async_trait]
impl Handler for CoderHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Coder
    }

    async fn handle(&self, input: &HandlerInput) -> Result<AgentReply, HandlerError> {
        let (template, hint) = Self::template_for(input.action);
        let prompt = template.replace("{message}", &input.message);
        let response = self
            .gateway
            .complete(&prompt, Some(CODER_SYSTEM), hint, None)
            .await?;
        Ok(AgentReply::ok(HandlerKind::Coder, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_actions_have_specialized_templates() {
        for action in ["review", "debug", "architecture", "refactor", "boilerplate", "tech_decision"]
        {
            let (template, _) = CoderHandler::template_for(action);
            assert!(template.contains("{message}"));
            assert_ne!(template, "{message}");
        }
    }

    #[test]
    fn fallback_passes_message_through() {
        let (template, hint) = CoderHandler::template_for("query");
        assert_eq!(template, "{message}");
        assert_eq!(hint, TaskHint::Coding);
    }
}
