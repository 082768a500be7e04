// src/main.rs
// Server binary: wires config, the sqlite pool, every external collaborator,
// and the axum HTTP surface around the orchestration core, grounded in the
// teacher's `main.rs` wiring shape (config load -> pool -> services ->
// router -> serve) but targeting an HTTP request/response transport instead
// of an MCP stdio server.

use assistant_core::address::deps::{PhpBackendGeocodingClient, ReqwestUrlResolver};
use assistant_core::agents::concrete::{AddressAgent, FaqAgent, SearchAgent};
use assistant_core::agents::AgentRegistry;
use assistant_core::api::{http, AppState};
use assistant_core::config::CONFIG;
use assistant_core::fire_and_forget::FireAndForgetQueue;
use assistant_core::flow::{FlowCache, PhpBackendFlowDispatcher};
use assistant_core::handoff::{FrappeIssueTracker, HandoffService, HandoffStats};
use assistant_core::intent::nlu::HttpNluClassifier;
use assistant_core::llm::openai::OpenAiLlmClient;
use assistant_core::orchestrator::auth::{PhpBackendAuthClient, PhpBackendAuthTrigger};
use assistant_core::search::deps::{
    HttpKeywordSearchClient, OpenSearchSemanticClient, PhpBackendSearchHistoryTracker, ReqwestEmbeddingClient, ReqwestRoutingClient,
};
use assistant_core::search::SearchExecutor;
use assistant_core::session::locks::KeyedLock;
use assistant_core::session::sqlite_store::SqliteSessionStore;
use assistant_core::Orchestrator;
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

fn build_agents(fire_and_forget: Arc<FireAndForgetQueue>) -> Arc<AgentRegistry> {
    let registry = Arc::new(AgentRegistry::new());

    let search_executor = Arc::new(SearchExecutor {
        embedding: Arc::new(ReqwestEmbeddingClient::new(CONFIG.external.embedding_service_url.clone())),
        semantic: Arc::new(OpenSearchSemanticClient::new(CONFIG.external.opensearch_url.clone())),
        keyword: Arc::new(HttpKeywordSearchClient::new(CONFIG.external.search_api_url.clone())),
        routing: Some(Arc::new(ReqwestRoutingClient::new(CONFIG.external.php_backend_url.clone()))),
        history_tracker: Some(Arc::new(PhpBackendSearchHistoryTracker::new(CONFIG.external.php_backend_url.clone()))),
        fire_and_forget,
    });
    registry.register(Arc::new(SearchAgent { executor: search_executor }));

    registry.register(Arc::new(AddressAgent {
        resolver: Arc::new(ReqwestUrlResolver::new()),
        geocoder: Arc::new(PhpBackendGeocodingClient::new(CONFIG.external.php_backend_url.clone())),
        llm: Arc::new(OpenAiLlmClient::new(
            CONFIG.external.llm.api_key.clone(),
            CONFIG.external.llm.base_url.clone(),
            CONFIG.external.llm.model.clone(),
        )),
    }));

    registry.register(Arc::new(FaqAgent));

    registry
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    CONFIG.logging.init();

    let pool = SqlitePoolOptions::new()
        .max_connections(CONFIG.database.max_connections)
        .connect(&CONFIG.database.database_url)
        .await?;
    SqliteSessionStore::migrate(&pool).await?;

    let fire_and_forget: Arc<FireAndForgetQueue> = FireAndForgetQueue::spawn(256).into();
    let agents = build_agents(fire_and_forget.clone());

    let orchestrator = Arc::new(Orchestrator {
        session_store: Arc::new(SqliteSessionStore::new(pool.clone())),
        locks: Arc::new(KeyedLock::new()),
        nlu: Arc::new(HttpNluClassifier::new(CONFIG.external.php_backend_url.clone())),
        flow_dispatcher: Arc::new(PhpBackendFlowDispatcher::new(CONFIG.external.php_backend_url.clone())),
        flow_cache: Arc::new(FlowCache::new(Duration::from_secs(CONFIG.flow_cache.ttl_secs))),
        agents: agents.clone(),
        handoff: Arc::new(HandoffService {
            agents,
            issue_tracker: Arc::new(FrappeIssueTracker::new(CONFIG.external.frappe.clone())),
            stats: Arc::new(HandoffStats::new()),
        }),
        auth_client: Arc::new(PhpBackendAuthClient::new(CONFIG.external.php_backend_url.clone())),
        auth_trigger: Arc::new(PhpBackendAuthTrigger::new(CONFIG.external.php_backend_url.clone())),
        fire_and_forget,
    });

    let state = AppState { orchestrator, sqlite_pool: pool };

    let app = Router::new()
        .merge(http::create_messages_router())
        .route("/health", axum::routing::get(http::health_check))
        .route("/ready", axum::routing::get(http::readiness_check))
        .route("/live", axum::routing::get(http::liveness_check))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", CONFIG.server.host, CONFIG.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "assistant-core listening");
    axum::serve(listener, app).await?;

    Ok(())
}
