//! Orchestrator — the end-to-end request state machine.
//!
//! `RECEIVED → ROUTED → ACTION_RESOLVED → DISPATCHED → PERSISTED → RETURNED`.
//!
//! Exactly one handler executes per request; the router's classification is
//! final. A handler failure is caught here and reported as a non-fatal reply
//! — that request persists nothing. A persistence failure is logged and
//! swallowed — the computed reply is still returned. The only failure that
//! escapes this boundary is a gateway with no usable provider at all.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::actions::extract_action;
use crate::error::{Error, HandlerError, LlmError};
use crate::handlers::{AgentReply, HandlerInput, HandlerSet};
use crate::llm::{Gateway, TaskHint};
use crate::mcp::McpRegistry;
use crate::mcp::formatters::format_history;
use crate::router::{HandlerKind, IntentRouter};
use crate::store::{Database, Session, Turn};

/// Session `agent_name` stamped on lazily created sessions.
const AGENT_NAME: &str = "aide";

/// One inbound request, already carrying a session id (the HTTP layer mints
/// one when the caller has none).
pub struct ChatTurn {
    pub message: String,
    pub session_id: String,
    /// Caller-supplied task hint — used on the conversational path; routed
    /// handlers choose their own hints per action.
    pub task_hint: TaskHint,
}

pub struct Orchestrator {
    gateway: Arc<Gateway>,
    registry: Arc<McpRegistry>,
    handlers: HandlerSet,
    db: Arc<dyn Database>,
    router: IntentRouter,
    history_window: usize,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<Gateway>,
        registry: Arc<McpRegistry>,
        handlers: HandlerSet,
        db: Arc<dyn Database>,
        history_window: usize,
    ) -> Self {
        let router = IntentRouter::new(Arc::clone(&gateway));
        Self {
            gateway,
            registry,
            handlers,
            db,
            router,
            history_window,
        }
    }

    /// Drive one request through the state machine.
    ///
    /// `Err` is reserved for the fatal case (`LlmError::NoUsableProvider`);
    /// every other failure comes back as an `AgentReply` with
    /// `success: false`.
    pub async fn handle_message(&self, turn: ChatTurn) -> Result<AgentReply, Error> {
        info!(session = %turn.session_id, "Received message");

        // RECEIVED → ROUTED. The router never fails.
        let target = self.router.route(&turn.message).await;

        let reply = if target.is_catch_all() {
            // Short-circuit: persona prompt + one completion, straight to
            // persistence.
            match self.converse(&turn).await {
                Ok(reply) => reply,
                Err(LlmError::NoUsableProvider) => return Err(LlmError::NoUsableProvider.into()),
                Err(e) => {
                    error!(handler = target.label(), error = %e, "Conversation failed");
                    return Ok(AgentReply::failure(
                        target,
                        format!("{} encountered an error: {e}", target.label()),
                    ));
                }
            }
        } else {
            // ROUTED → ACTION_RESOLVED. Pure, always succeeds.
            let action = extract_action(&turn.message, target);
            info!(handler = target.label(), action, "Dispatching");

            // ACTION_RESOLVED → DISPATCHED, with a fresh context bundle.
            let context = self.registry.global_context(None).await;
            let input = HandlerInput {
                message: turn.message.clone(),
                action,
                context,
            };

            let Some(handler) = self.handlers.get(target) else {
                warn!(handler = target.label(), "No implementation registered");
                return Ok(AgentReply::failure(
                    target,
                    format!("{} encountered an error: not available", target.label()),
                ));
            };

            match handler.handle(&input).await {
                Ok(reply) => reply,
                Err(HandlerError::Llm(LlmError::NoUsableProvider)) => {
                    return Err(LlmError::NoUsableProvider.into());
                }
                Err(e) => {
                    // Caught at this boundary; the assistant half of the turn
                    // is never persisted.
                    error!(handler = target.label(), error = %e, "Handler failed");
                    return Ok(AgentReply::failure(
                        target,
                        format!("{} encountered an error: {e}", target.label()),
                    ));
                }
            }
        };

        // DISPATCHED → PERSISTED. Best-effort relative to response delivery.
        if let Err(e) = self.persist(&turn, &reply).await {
            error!(session = %turn.session_id, error = %e, "Failed to save session history");
        }

        // PERSISTED → RETURNED.
        Ok(reply)
    }

    /// The catch-all conversational path.
    async fn converse(&self, turn: &ChatTurn) -> Result<AgentReply, LlmError> {
        let bundle = self.registry.global_context(None).await;

        let history = match self.db.load_session(&turn.session_id).await {
            Ok(Some(session)) => format_history(&session.messages, self.history_window),
            Ok(None) => format_history(&[], self.history_window),
            Err(e) => {
                warn!(error = %e, "History load failed, continuing without it");
                format_history(&[], self.history_window)
            }
        };

        let system = self
            .registry
            .formatter("assistant_system_prompt")
            .map(|f| f.format(&bundle, Some(&history)));

        let output = self
            .gateway
            .complete(&turn.message, system.as_deref(), turn.task_hint, None)
            .await?;
        Ok(AgentReply::ok(HandlerKind::Assistant, output))
    }

    /// Load-or-create the session and append both halves of the exchange.
    ///
    /// Unguarded read-modify-write: concurrent requests on the same session
    /// id are last-write-wins at the document level.
    async fn persist(
        &self,
        turn: &ChatTurn,
        reply: &AgentReply,
    ) -> Result<(), crate::error::DatabaseError> {
        let mut session = self
            .db
            .load_session(&turn.session_id)
            .await?
            .unwrap_or_else(|| Session::new(&turn.session_id, AGENT_NAME));

        session.push(Turn::user(&turn.message));
        session.push(Turn::assistant(&reply.output, &reply.agent));
        session.touch();
        self.db.save_session(&session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::handlers::Handler;
    use crate::llm::LlmProvider;
    use crate::store::LibSqlBackend;

    struct FixedProvider {
        reply: &'static str,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn is_usable(&self) -> bool {
            true
        }

        async fn complete(
            &self,
            _prompt: &str,
            _system: Option<&str>,
            _hint: TaskHint,
        ) -> Result<String, LlmError> {
            Ok(self.reply.to_string())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl Handler for FailingHandler {
        fn kind(&self) -> HandlerKind {
            HandlerKind::Coder
        }

        async fn handle(&self, _input: &HandlerInput) -> Result<AgentReply, HandlerError> {
            Err(HandlerError::Normalization("scripted failure".into()))
        }
    }

    async fn orchestrator_with(
        route_reply: &'static str,
        handlers: HandlerSet,
    ) -> (Orchestrator, Arc<dyn Database>) {
        let provider = Arc::new(FixedProvider { reply: route_reply });
        let gateway = Arc::new(Gateway::new(provider.clone(), provider, 2000));
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let orchestrator = Orchestrator::new(
            gateway,
            Arc::new(McpRegistry::new()),
            handlers,
            Arc::clone(&db),
            12,
        );
        (orchestrator, db)
    }

    #[tokio::test]
    async fn handler_failure_is_reported_and_not_persisted() {
        let mut handlers = HandlerSet::new();
        handlers.insert(Arc::new(FailingHandler));
        let (orchestrator, db) = orchestrator_with("CODER", handlers).await;

        let reply = orchestrator
            .handle_message(ChatTurn {
                message: "fix this bug".into(),
                session_id: "s1".into(),
                task_hint: TaskHint::General,
            })
            .await
            .unwrap();

        assert!(!reply.success);
        assert!(reply.output.contains("CODER encountered an error"));
        assert!(db.load_session("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unregistered_handler_is_reported() {
        let (orchestrator, _db) = orchestrator_with("CODER", HandlerSet::new()).await;
        let reply = orchestrator
            .handle_message(ChatTurn {
                message: "fix this bug".into(),
                session_id: "s1".into(),
                task_hint: TaskHint::General,
            })
            .await
            .unwrap();
        assert!(!reply.success);
    }

    #[tokio::test]
    async fn catch_all_persists_both_turns() {
        // Router output is invalid → catch-all; the same fixed reply then
        // serves as the conversational answer.
        let (orchestrator, db) = orchestrator_with("not-a-label", HandlerSet::new()).await;

        let reply = orchestrator
            .handle_message(ChatTurn {
                message: "hello there".into(),
                session_id: "s2".into(),
                task_hint: TaskHint::General,
            })
            .await
            .unwrap();

        assert!(reply.success);
        assert_eq!(reply.agent, "ASSISTANT");

        let session = db.load_session("s2").await.unwrap().unwrap();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].content, "hello there");
        assert_eq!(session.messages[1].agent.as_deref(), Some("ASSISTANT"));
    }
}
