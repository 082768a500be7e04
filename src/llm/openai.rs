// src/llm/openai.rs
// A thin OpenAI-compatible chat-completions client, grounded in the
// teacher's `llm/provider/openai.rs` request shape but trimmed to the two
// operations `LlmClient` needs.

use super::{AddressLlmExtraction, LlmClient, DEFAULT_LLM_TIMEOUT};
use async_trait::async_trait;
use serde_json::json;

pub struct OpenAiLlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiLlmClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(DEFAULT_LLM_TIMEOUT).build().expect("reqwest client"),
            api_key,
            base_url,
            model,
        }
    }

    async fn complete(&self, system_prompt: &str, user_message: &str) -> anyhow::Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_message},
            ],
        });

        let resp: serde_json::Value = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        resp["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("missing completion content"))
    }
}

#[async_trait]
impl LlmClient for OpenAiLlmClient {
    async fn extract_address(&self, raw_text: &str) -> anyhow::Result<AddressLlmExtraction> {
        let system = "Extract a delivery address from the user's message. Respond with a JSON \
            object: {\"address\": string, \"landmark\": string|null, \"confidence\": number between \
            0 and 1, \"needs_clarification\": bool, \"clarification_question\": string|null}. \
            Nothing else.";
        let raw = self.complete(system, raw_text).await?;
        let parsed: AddressLlmExtraction = serde_json::from_str(raw.trim())
            .map_err(|e| anyhow::anyhow!("could not parse LLM address extraction: {e}: {raw}"))?;
        Ok(parsed)
    }

    async fn chat(&self, system_prompt: &str, user_message: &str) -> anyhow::Result<String> {
        self.complete(system_prompt, user_message).await
    }
}
