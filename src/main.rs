use std::sync::Arc;

use aide::config::Config;
use aide::handlers::{CoderHandler, HandlerSet, MentorHandler, PlannerHandler, ScholarHandler};
use aide::http::{AppState, app_routes};
use aide::integrations::Integrations;
use aide::llm::Gateway;
use aide::mcp::formatters::AssistantFormatter;
use aide::mcp::providers::{ProjectListProvider, ProjectsProvider, TasksProvider, TimeProvider};
use aide::mcp::tools::{ProjectsTool, TasksTool};
use aide::mcp::McpRegistry;
use aide::orchestrator::Orchestrator;
use aide::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    eprintln!("aide v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Chat API: http://{}/api/chat", config.bind_addr);
    eprintln!("   Database: {}", config.db_path);

    // ── Database ─────────────────────────────────────────────────────
    let db_path = std::path::Path::new(&config.db_path);
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_local(db_path).await.map_err(|e| {
        anyhow::anyhow!("Failed to open database at {}: {e}", config.db_path)
    })?);

    // ── Inference gateway ────────────────────────────────────────────
    let gateway = Arc::new(Gateway::from_config(&config.llm));

    // ── Registry: context providers, formatters, tools ───────────────
    let mut registry = McpRegistry::new();
    registry.register_provider(Arc::new(ProjectsProvider::new(Arc::clone(&db))));
    registry.register_provider(Arc::new(ProjectListProvider::new(Arc::clone(&db))));
    registry.register_provider(Arc::new(TasksProvider::new(Arc::clone(&db))));
    registry.register_provider(Arc::new(TimeProvider));
    registry.register_formatter(Arc::new(AssistantFormatter));
    registry.register_tool(Arc::new(ProjectsTool::new(Arc::clone(&db))));
    registry.register_tool(Arc::new(TasksTool::new(Arc::clone(&db))));
    let registry = Arc::new(registry);

    // ── Handlers ─────────────────────────────────────────────────────
    let integrations = Arc::new(Integrations::from_config(&config.integrations));
    let mut handlers = HandlerSet::new();
    handlers.insert(Arc::new(PlannerHandler::new(
        Arc::clone(&gateway),
        Arc::clone(&registry),
        Arc::clone(&integrations),
    )));
    handlers.insert(Arc::new(CoderHandler::new(Arc::clone(&gateway))));
    handlers.insert(Arc::new(ScholarHandler::new(
        Arc::clone(&gateway),
        Arc::clone(&integrations),
    )));
    handlers.insert(Arc::new(MentorHandler::new(Arc::clone(&gateway))));

    let orchestrator = Arc::new(Orchestrator::new(
        gateway,
        registry,
        handlers,
        Arc::clone(&db),
        config.history_window,
    ));

    // ── HTTP surface ─────────────────────────────────────────────────
    let app = app_routes(AppState { orchestrator, db });
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
