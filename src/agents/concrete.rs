// src/agents/concrete.rs
// The handful of concrete agents registered in production (main.rs,
// bin/smoke.rs), grounded in the teacher's practice of keeping agent
// bodies as thin adapters over an already-built capability rather than
// reimplementing logic at the registry boundary.

use super::types::{Agent, AgentContext, AgentOutcome};
use crate::address::deps::{GeocodingClient, UrlResolver};
use crate::address::types::ExtractionOutcome;
use crate::address::AddressPipeline;
use crate::llm::LlmClient;
use crate::search::types::SearchArgs;
use crate::search::{SearchContext, SearchExecutor};
use async_trait::async_trait;
use std::sync::Arc;

/// C11 wiring: routes `search_agent:default` into `SearchExecutor::search_products`.
pub struct SearchAgent {
    pub executor: Arc<SearchExecutor>,
}

#[async_trait]
impl Agent for SearchAgent {
    fn id(&self) -> &str {
        "search_agent:default"
    }

    async fn execute(&self, ctx: &AgentContext) -> anyhow::Result<AgentOutcome> {
        let args = SearchArgs { query: ctx.message.clone(), ..Default::default() };
        let search_ctx = SearchContext {
            participant_id: ctx.participant_id.clone(),
            cached_zone_id: ctx.session.zone_id,
            location: ctx.session.location.as_ref().map(|l| (l.lat, l.lng)),
            context_module: ctx.session.module.clone(),
            profile_veg: None,
        };

        let resp = self.executor.search_products(args, &search_ctx, None).await;
        Ok(AgentOutcome::text(resp.message.clone()).with_metadata(serde_json::json!({ "search": resp })))
    }
}

/// C4 wiring: routes `address_agent:default` into `AddressPipeline::extract`.
pub struct AddressAgent {
    pub resolver: Arc<dyn UrlResolver>,
    pub geocoder: Arc<dyn GeocodingClient>,
    pub llm: Arc<dyn LlmClient>,
}

#[async_trait]
impl Agent for AddressAgent {
    fn id(&self) -> &str {
        "address_agent:default"
    }

    async fn execute(&self, ctx: &AgentContext) -> anyhow::Result<AgentOutcome> {
        let pipeline = AddressPipeline { resolver: self.resolver.as_ref(), geocoder: self.geocoder.as_ref(), llm: self.llm.as_ref() };
        let outcome = pipeline.extract(&ctx.message).await;

        Ok(match outcome {
            ExtractionOutcome::Success(address) => {
                AgentOutcome::text(format!("Got it — {}.", address.address)).with_metadata(serde_json::json!({ "address": address }))
            }
            ExtractionOutcome::NeedsMoreInfo { clarification_prompt, options } => {
                let buttons = options.iter().map(|o| crate::utils::buttons::Button::new(*o, *o)).collect();
                AgentOutcome { response: clarification_prompt, buttons, metadata: serde_json::Value::Null, handoff: None }
            }
            ExtractionOutcome::Error(e) => {
                tracing::warn!(error = %e, "address extraction failed");
                AgentOutcome::text("I couldn't work out that address, could you share your location or a full address?")
            }
        })
    }
}

/// Fallback agent `AgentRegistry::get_or_faq` resolves to when the routed
/// agent isn't registered (spec §4.5 "FAQ fallback").
pub struct FaqAgent;

#[async_trait]
impl Agent for FaqAgent {
    fn id(&self) -> &str {
        "faq_agent:default"
    }

    async fn execute(&self, _ctx: &AgentContext) -> anyhow::Result<AgentOutcome> {
        Ok(AgentOutcome::text(
            "I'm not sure how to help with that yet, but I can help you order food, search products, book a parcel, or track an order.",
        ))
    }
}
