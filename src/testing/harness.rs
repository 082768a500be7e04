// src/testing/harness.rs
// Assembles a fully-wired `Orchestrator` from the fakes in this module,
// with every collaborator individually overridable — the in-process
// equivalent of the teacher's `TestClient` builder.

use super::fakes::{
    AlwaysAuthClient, AlwaysRequiresAuth, InMemoryIssueTracker, InMemorySessionStore, NoFlowDispatcher,
};
use crate::agents::AgentRegistry;
use crate::fire_and_forget::FireAndForgetQueue;
use crate::flow::{FlowCache, FlowDispatcher};
use crate::handoff::HandoffService;
use crate::handoff::{HandoffStats, IssueTracker};
use crate::intent::nlu::NluClassifier;
use crate::orchestrator::auth::{AuthClient, AuthTrigger};
use crate::orchestrator::types::{ProcessMessageRequest, ProcessMessageResponse};
use crate::orchestrator::Orchestrator;
use crate::session::locks::KeyedLock;
use crate::session::{Session, SessionStore};
use std::sync::Arc;
use std::time::Duration;

pub struct TestHarness {
    pub orchestrator: Orchestrator,
}

pub struct TestHarnessBuilder {
    session_store: Arc<dyn SessionStore>,
    nlu: Option<Arc<dyn NluClassifier>>,
    flow_dispatcher: Arc<dyn FlowDispatcher>,
    agents: Arc<AgentRegistry>,
    issue_tracker: Arc<dyn IssueTracker>,
    auth_client: Arc<dyn AuthClient>,
    auth_trigger: Arc<dyn AuthTrigger>,
}

impl TestHarnessBuilder {
    pub fn new() -> Self {
        Self {
            session_store: Arc::new(InMemorySessionStore::new()),
            nlu: None,
            flow_dispatcher: Arc::new(NoFlowDispatcher),
            agents: Arc::new(AgentRegistry::new()),
            issue_tracker: Arc::new(InMemoryIssueTracker::new()),
            auth_client: Arc::new(AlwaysAuthClient::default()),
            auth_trigger: Arc::new(AlwaysRequiresAuth(false)),
        }
    }

    pub fn with_nlu(mut self, nlu: Arc<dyn NluClassifier>) -> Self {
        self.nlu = Some(nlu);
        self
    }

    pub fn with_flow_dispatcher(mut self, dispatcher: Arc<dyn FlowDispatcher>) -> Self {
        self.flow_dispatcher = dispatcher;
        self
    }

    pub fn with_agents(mut self, agents: Arc<AgentRegistry>) -> Self {
        self.agents = agents;
        self
    }

    pub fn with_auth_client(mut self, client: Arc<dyn AuthClient>) -> Self {
        self.auth_client = client;
        self
    }

    pub fn with_auth_trigger(mut self, trigger: Arc<dyn AuthTrigger>) -> Self {
        self.auth_trigger = trigger;
        self
    }

    pub fn build(self) -> TestHarness {
        let nlu = self.nlu.unwrap_or_else(|| {
            Arc::new(super::fakes::ScriptedNlu::once(crate::intent::nlu::NluClassification {
                intent: crate::intent::types::Intent::Unknown,
                confidence: 0.0,
                entities: Default::default(),
                raw: None,
                needs_clarification: false,
                clarification_options: vec![],
            }))
        });

        let orchestrator = Orchestrator {
            session_store: self.session_store,
            locks: Arc::new(KeyedLock::new()),
            nlu,
            flow_dispatcher: self.flow_dispatcher,
            flow_cache: Arc::new(FlowCache::new(Duration::from_secs(60))),
            agents: self.agents.clone(),
            handoff: Arc::new(HandoffService { agents: self.agents, issue_tracker: self.issue_tracker, stats: Arc::new(HandoffStats::new()) }),
            auth_client: self.auth_client,
            auth_trigger: self.auth_trigger,
            fire_and_forget: FireAndForgetQueue::spawn(64).into(),
        };

        TestHarness { orchestrator }
    }
}

impl Default for TestHarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub async fn send(&self, participant_id: &str, message: &str) -> ProcessMessageResponse {
        self.orchestrator.process_message(ProcessMessageRequest::new(participant_id, message)).await
    }

    pub async fn send_with_session(&self, participant_id: &str, message: &str, session: Session) -> ProcessMessageResponse {
        let mut req = ProcessMessageRequest::new(participant_id, message);
        req.test_session = Some(session);
        self.orchestrator.process_message(req).await
    }

    pub async fn session(&self, participant_id: &str) -> Option<Session> {
        self.orchestrator.session_store.get(participant_id).await.unwrap()
    }
}
