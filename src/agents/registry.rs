// src/agents/registry.rs
// Agent registry for looking up agents by id, grounded in the teacher's
// `AgentRegistry` (`RwLock<HashMap<String, AgentDefinition>>`), adapted
// from a config-file loader to a programmatic registration API since this
// domain's agents are specialized business-logic modules, not
// user-authored config.

use super::types::Agent;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub struct AgentRegistry {
    agents: RwLock<HashMap<String, Arc<dyn Agent>>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self { agents: RwLock::new(HashMap::new()) }
    }

    pub fn register(&self, agent: Arc<dyn Agent>) {
        let id = agent.id().to_string();
        tracing::info!(agent_id = %id, "registered agent");
        self.agents.write().unwrap().insert(id, agent);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Agent>> {
        self.agents.read().unwrap().get(id).cloned()
    }

    /// Falls back to the FAQ agent when `id` is unregistered, matching the
    /// "FAQ fallback" of spec §4.5.
    pub fn get_or_faq(&self, id: &str) -> Option<Arc<dyn Agent>> {
        self.get(id).or_else(|| self.get("faq_agent:default"))
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::types::{AgentContext, AgentOutcome};
    use async_trait::async_trait;

    struct Stub(&'static str);
    #[async_trait]
    impl Agent for Stub {
        fn id(&self) -> &str {
            self.0
        }
        async fn execute(&self, _ctx: &AgentContext) -> anyhow::Result<AgentOutcome> {
            Ok(AgentOutcome::text("stub"))
        }
    }

    #[test]
    fn unregistered_agent_falls_back_to_faq() {
        let registry = AgentRegistry::new();
        registry.register(Arc::new(Stub("faq_agent:default")));
        assert!(registry.get("nonexistent").is_none());
        assert!(registry.get_or_faq("nonexistent").is_some());
    }
}
