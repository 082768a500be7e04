// src/bin/smoke.rs
// Local smoke-test entry point: drives `processMessage` directly from a
// terminal, without standing up the axum transport. Same production wiring
// as `main.rs`, minus the HTTP layer — for poking at the pipeline by hand
// during development.

use assistant_core::address::deps::{PhpBackendGeocodingClient, ReqwestUrlResolver};
use assistant_core::agents::concrete::{AddressAgent, FaqAgent, SearchAgent};
use assistant_core::agents::AgentRegistry;
use assistant_core::config::CONFIG;
use assistant_core::fire_and_forget::FireAndForgetQueue;
use assistant_core::flow::{FlowCache, PhpBackendFlowDispatcher};
use assistant_core::handoff::{FrappeIssueTracker, HandoffService, HandoffStats};
use assistant_core::intent::nlu::HttpNluClassifier;
use assistant_core::llm::openai::OpenAiLlmClient;
use assistant_core::orchestrator::auth::{PhpBackendAuthClient, PhpBackendAuthTrigger};
use assistant_core::orchestrator::types::ProcessMessageRequest;
use assistant_core::search::deps::{
    HttpKeywordSearchClient, OpenSearchSemanticClient, PhpBackendSearchHistoryTracker, ReqwestEmbeddingClient, ReqwestRoutingClient,
};
use assistant_core::search::SearchExecutor;
use assistant_core::session::locks::KeyedLock;
use assistant_core::session::sqlite_store::SqliteSessionStore;
use assistant_core::Orchestrator;
use sqlx::sqlite::SqlitePoolOptions;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

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

    let pool = SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await?;
    SqliteSessionStore::migrate(&pool).await?;

    let fire_and_forget: Arc<FireAndForgetQueue> = FireAndForgetQueue::spawn(16).into();
    let agents = build_agents(fire_and_forget.clone());

    let orchestrator = Orchestrator {
        session_store: Arc::new(SqliteSessionStore::new(pool)),
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
    };

    let participant_id = std::env::args().nth(1).unwrap_or_else(|| "smoke-tester".to_string());
    println!("assistant-core smoke REPL — participant_id={participant_id}, Ctrl-D to exit");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let resp = orchestrator.process_message(ProcessMessageRequest::new(participant_id.as_str(), line)).await;
        println!("{}", resp.response);
        if !resp.buttons.is_empty() {
            for button in &resp.buttons {
                println!("  [{}] -> {}", button.label, button.value);
            }
        }
        stdout.flush()?;
    }

    Ok(())
}
