// src/agents/types.rs
// C9: Agent Registry + invocation — the single-call contract specialized
// agents (FAQ, search, order, ...) are invoked through. Most agent bodies
// are out of scope (spec §1); `agents::concrete` wires the two this crate
// does own (C4 address extraction, C11 search) into that contract.

use crate::intent::types::RoutingResult;
use crate::session::Session;
use crate::utils::buttons::Button;
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct AgentContext {
    pub participant_id: String,
    pub message: String,
    pub routing: RoutingResult,
    pub session: Session,
    pub user_preference_context: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub response: String,
    pub buttons: Vec<Button>,
    pub metadata: Value,
    /// Set when the agent wants to delegate mid-execution (spec §4.8.2).
    pub handoff: Option<crate::handoff::types::HandoffRequest>,
}

impl AgentOutcome {
    pub fn text(response: impl Into<String>) -> Self {
        Self { response: response.into(), buttons: vec![], metadata: Value::Null, handoff: None }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn id(&self) -> &str;

    async fn execute(&self, ctx: &AgentContext) -> anyhow::Result<AgentOutcome>;
}
