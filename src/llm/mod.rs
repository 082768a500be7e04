// src/llm/mod.rs
// The one LLM capability the core consumes, modeled as a trait object per
// spec §9 ("model as a capability the core consumes; the orchestrator must
// not know provider specifics"). Grounded in the teacher's
// `llm::provider::LlmProvider` trait-object pattern, trimmed to the two
// calls this domain actually makes: free-form address extraction (§4.4
// strategy 4) and a canned-fallback chat completion used when a flow or
// agent needs a one-shot LLM reply and degrades on timeout (§5, §7).

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddressLlmExtraction {
    pub address: String,
    pub landmark: Option<String>,
    pub confidence: f32,
    pub needs_clarification: bool,
    pub clarification_question: Option<String>,
}

/// Deadline every LLM call must carry (spec §5, §9).
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(8);

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn extract_address(&self, raw_text: &str) -> anyhow::Result<AddressLlmExtraction>;

    /// One-shot chat completion; callers must treat failure as `Transient`
    /// and degrade to a canned fallback string (spec §7).
    async fn chat(&self, system_prompt: &str, user_message: &str) -> anyhow::Result<String>;
}

/// Canned fallback used by every caller when the LLM call itself fails or
/// times out (spec §5 "LLM -> canned fallback string").
pub const LLM_CANNED_FALLBACK: &str =
    "I'm having trouble thinking that through right now — could you rephrase, or try again in a moment?";
