//! Scholar — research, summaries, learning paths, note capture.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::handlers::{AgentReply, Handler, HandlerInput};
use crate::integrations::Integrations;
use crate::llm::{Gateway, TaskHint};
use crate::router::HandlerKind;

const SCHOLAR_SYSTEM: &str = "\
You are the research handler of a personal assistant.

Your job:
- Answer research questions sharply, with no fluff
- Summarize papers and technical content into dense, structured notes
- Build structured learning paths when asked
- Cite sources when you rely on them
- Format: bullet points, code blocks where relevant, dense not verbose";

const SUMMARY_PROMPT: &str = "\
Summarize this content for a technical reader.
Be sharp and structured. Extract:
1. Core concept / what it does
2. Key technical details (methods, architecture, results)
3. Practical application
4. 3-5 key takeaways as bullets

Content:
{message}";

const LEARNING_PATH_PROMPT: &str = "\
Create a structured learning path for this request.

Request: {message}

Format:
- Phase 1: Foundation (1-2 weeks)
- Phase 2: Core Concepts (2-4 weeks)
- Phase 3: Advanced / Research level (ongoing)

For each phase: specific resources, projects to build, concepts to master.
Be concrete — actual paper names, library docs, project ideas.";

pub struct ScholarHandler {
    gateway: Arc<Gateway>,
    integrations: Arc<Integrations>,
}

impl ScholarHandler {
    pub fn new(gateway: Arc<Gateway>, integrations: Arc<Integrations>) -> Self {
        Self {
            gateway,
            integrations,
        }
    }

    /// Capture the message into the external note store.
    async fn ingest(&self, message: &str) -> AgentReply {
        let notion = &self.integrations.notion;
        if !notion.is_configured() {
            return AgentReply::failure(
                HandlerKind::Scholar,
                "Knowledge capture not configured. Set NOTION_API_KEY.",
            );
        }
        let Some(database_id) = notion.default_database() else {
            return AgentReply::failure(
                HandlerKind::Scholar,
                "No note database configured. Set NOTION_DAILY_LOG_DB.",
            );
        };

        let title = format!("Captured — {}", chrono::Utc::now().format("%Y-%m-%d %H:%M"));
        match notion.create_note(database_id, &title, message).await {
            Ok(url) => AgentReply::ok(HandlerKind::Scholar, format!("Saved to knowledge base: {url}")),
            Err(e) => AgentReply::failure(HandlerKind::Scholar, format!("Capture failed: {e}")),
        }
    }
}

#[async_trait]
impl Handler for ScholarHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Scholar
    }

    async fn handle(&self, input: &HandlerInput) -> Result<AgentReply, HandlerError> {
        let (prompt, hint) = match input.action {
            "summarize" => (SUMMARY_PROMPT.replace("{message}", &input.message), TaskHint::LongContext),
            "learning_path" => (
                LEARNING_PATH_PROMPT.replace("{message}", &input.message),
                TaskHint::ResearchHeavy,
            ),
            "ingest" => return Ok(self.ingest(&input.message).await),
            _ => (input.message.clone(), TaskHint::ResearchHeavy),
        };

        let response = self
            .gateway
            .complete(&prompt, Some(SCHOLAR_SYSTEM), hint, None)
            .await?;
        Ok(AgentReply::ok(HandlerKind::Scholar, response))
    }
}
