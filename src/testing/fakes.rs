// src/testing/fakes.rs
// In-memory stand-ins for every external collaborator the orchestrator
// depends on, in the teacher's "fake over mock framework" style (plain
// structs implementing the trait directly, no mocking DSL).

use crate::agents::{Agent, AgentContext, AgentOutcome};
use crate::flow::dispatcher::FlowDispatcher;
use crate::flow::types::{FlowDefinition, FlowHandle, FlowStepResult};
use crate::handoff::IssueTracker;
use crate::intent::nlu::{NluClassification, NluClassifier, NluContext};
use crate::orchestrator::auth::{AuthClient, AuthTrigger, UserProfile};
use crate::session::{Session, SessionStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory session store, keyed the same way the sqlite-backed one is.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Session>> {
        Ok(self.sessions.lock().unwrap().get(key).cloned())
    }

    async fn save(&self, session: &Session) -> anyhow::Result<()> {
        self.sessions.lock().unwrap().insert(session.key.clone(), session.clone());
        Ok(())
    }
}

/// Scripted NLU classifier: returns the next queued classification
/// regardless of the message, or `Unknown` once the script runs dry.
pub struct ScriptedNlu {
    script: Mutex<Vec<NluClassification>>,
}

impl ScriptedNlu {
    pub fn new(script: Vec<NluClassification>) -> Self {
        Self { script: Mutex::new(script) }
    }

    pub fn once(classification: NluClassification) -> Self {
        Self::new(vec![classification])
    }
}

#[async_trait]
impl NluClassifier for ScriptedNlu {
    async fn classify(&self, _message: &str, _context: &NluContext) -> anyhow::Result<NluClassification> {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            Ok(script.remove(0))
        } else {
            Ok(script.first().cloned().unwrap_or(NluClassification {
                intent: crate::intent::types::Intent::Unknown,
                confidence: 0.0,
                entities: Default::default(),
                raw: None,
                needs_clarification: false,
                clarification_options: vec![],
            }))
        }
    }
}

/// No active flow, ever. The orchestrator falls straight through gates 9
/// through 12 with this dispatcher — useful for tests exercising routing,
/// auth, or clarification without a flow engine in the loop.
pub struct NoFlowDispatcher;

#[async_trait]
impl FlowDispatcher for NoFlowDispatcher {
    async fn get_active_flow(&self, _key: &str) -> anyhow::Result<Option<FlowHandle>> {
        Ok(None)
    }
    async fn is_in_wait_state(&self, _key: &str) -> anyhow::Result<bool> {
        Ok(false)
    }
    async fn process_active_flow(&self, _key: &str, _message: &str, _intent: &str, _confidence: f32) -> anyhow::Result<FlowStepResult> {
        unreachable!("no active flow was configured")
    }
    async fn start_flow(&self, flow_id: &str, _init_ctx: serde_json::Value) -> anyhow::Result<FlowStepResult> {
        Ok(FlowStepResult {
            response: format!("Starting {flow_id}."),
            buttons: vec![],
            metadata: serde_json::Value::Null,
            completed: false,
        })
    }
    async fn find_flow_by_intent(&self, _intent: &str, _module: Option<&str>, _message: Option<&str>) -> anyhow::Result<Option<FlowDefinition>> {
        Ok(None)
    }
    async fn suspend_flow(&self, _key: &str) -> anyhow::Result<()> {
        Ok(())
    }
    async fn cancel_flow(&self, _key: &str) -> anyhow::Result<()> {
        Ok(())
    }
    async fn resume_suspended_flow(&self, _key: &str) -> anyhow::Result<bool> {
        Ok(false)
    }
}

/// Always-succeeds auth client, for exercising the happy-path state
/// machine without a real phone/OTP provider.
pub struct AlwaysAuthClient {
    pub profile: UserProfile,
}

impl Default for AlwaysAuthClient {
    fn default() -> Self {
        Self { profile: UserProfile { user_id: 1, auth_token: "test-token".to_string(), is_personal_info: true, name: Some("Test User".to_string()), email: Some("test@example.com".to_string()) } }
    }
}

#[async_trait]
impl AuthClient for AlwaysAuthClient {
    async fn send_otp(&self, _phone: &str) -> anyhow::Result<()> {
        Ok(())
    }
    async fn verify_otp(&self, _phone: &str, _code: &str) -> anyhow::Result<Option<UserProfile>> {
        Ok(Some(self.profile.clone()))
    }
    async fn update_user_info(&self, _phone: &str, name: &str, email: &str) -> anyhow::Result<UserProfile> {
        Ok(UserProfile { name: Some(name.to_string()), email: Some(email.to_string()), ..self.profile.clone() })
    }
}

/// Auth trigger that always says "yes, this pair needs auth" — or always
/// "no", per `AlwaysRequiresAuth::new(false)`.
pub struct AlwaysRequiresAuth(pub bool);

#[async_trait]
impl AuthTrigger for AlwaysRequiresAuth {
    async fn requires_auth(&self, _action: &str, _module: &str) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}

/// Records every issue it's asked to create; never finds an existing one
/// unless pre-seeded.
#[derive(Default)]
pub struct InMemoryIssueTracker {
    next_id: AtomicUsize,
    existing: Mutex<HashMap<String, String>>,
}

impl InMemoryIssueTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IssueTracker for InMemoryIssueTracker {
    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<String>> {
        Ok(self.existing.lock().unwrap().get(external_id).cloned())
    }
    async fn create_issue(&self, external_id: &str, _subject: &str, _description: &str, _priority: &str) -> anyhow::Result<String> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("HD-{n}");
        self.existing.lock().unwrap().insert(external_id.to_string(), id.clone());
        Ok(id)
    }
}

/// Canned-response agent, for agent-fallback gate tests.
pub struct CannedAgent {
    pub agent_id: String,
    pub response: String,
}

#[async_trait]
impl Agent for CannedAgent {
    fn id(&self) -> &str {
        &self.agent_id
    }
    async fn execute(&self, _ctx: &AgentContext) -> anyhow::Result<AgentOutcome> {
        Ok(AgentOutcome::text(self.response.clone()))
    }
}
