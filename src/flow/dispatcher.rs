// src/flow/dispatcher.rs
// C7: Flow Dispatcher — a thin facade over the external Flow Engine (spec
// §4.7). The core never interprets flow state; it only asks these six
// questions of it.

use super::types::{FlowDefinition, FlowHandle, FlowStepResult};
use async_trait::async_trait;

#[async_trait]
pub trait FlowDispatcher: Send + Sync {
    async fn get_active_flow(&self, key: &str) -> anyhow::Result<Option<FlowHandle>>;

    async fn is_in_wait_state(&self, key: &str) -> anyhow::Result<bool>;

    async fn process_active_flow(
        &self,
        key: &str,
        message: &str,
        intent: &str,
        confidence: f32,
    ) -> anyhow::Result<FlowStepResult>;

    async fn start_flow(&self, flow_id: &str, init_ctx: serde_json::Value) -> anyhow::Result<FlowStepResult>;

    async fn find_flow_by_intent(
        &self,
        intent: &str,
        module: Option<&str>,
        message: Option<&str>,
    ) -> anyhow::Result<Option<FlowDefinition>>;

    async fn suspend_flow(&self, key: &str) -> anyhow::Result<()>;

    async fn cancel_flow(&self, key: &str) -> anyhow::Result<()>;

    async fn resume_suspended_flow(&self, key: &str) -> anyhow::Result<bool>;
}

/// HTTP-backed Flow Dispatcher, per spec §9 design notes: the PHP backend
/// exposes the flow engine at `FlowEngine -> auth_v1`-style routes under the
/// same base URL the auth and NLU clients use.
pub struct PhpBackendFlowDispatcher {
    client: reqwest::Client,
    base_url: String,
}

impl PhpBackendFlowDispatcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl FlowDispatcher for PhpBackendFlowDispatcher {
    async fn get_active_flow(&self, key: &str) -> anyhow::Result<Option<FlowHandle>> {
        let resp: serde_json::Value = self
            .client
            .get(format!("{}/api/v1/flows/active", self.base_url))
            .query(&[("key", key)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if resp.is_null() {
            return Ok(None);
        }
        Ok(Some(FlowHandle {
            flow_id: resp["flowId"].as_str().unwrap_or_default().to_string(),
            flow_run_id: resp["flowRunId"].as_str().unwrap_or_default().to_string(),
            current_state_id: resp["currentStateId"].as_str().unwrap_or_default().to_string(),
        }))
    }

    async fn is_in_wait_state(&self, key: &str) -> anyhow::Result<bool> {
        let resp: serde_json::Value = self
            .client
            .get(format!("{}/api/v1/flows/wait-state", self.base_url))
            .query(&[("key", key)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp["waiting"].as_bool().unwrap_or(false))
    }

    async fn process_active_flow(&self, key: &str, message: &str, intent: &str, confidence: f32) -> anyhow::Result<FlowStepResult> {
        let resp: serde_json::Value = self
            .client
            .post(format!("{}/api/v1/flows/step", self.base_url))
            .json(&serde_json::json!({ "key": key, "message": message, "intent": intent, "confidence": confidence }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_step_result(resp)
    }

    async fn start_flow(&self, flow_id: &str, init_ctx: serde_json::Value) -> anyhow::Result<FlowStepResult> {
        let resp: serde_json::Value = self
            .client
            .post(format!("{}/api/v1/flows/start", self.base_url))
            .json(&serde_json::json!({ "flowId": flow_id, "context": init_ctx }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_step_result(resp)
    }

    async fn find_flow_by_intent(&self, intent: &str, module: Option<&str>, message: Option<&str>) -> anyhow::Result<Option<FlowDefinition>> {
        let resp: serde_json::Value = self
            .client
            .get(format!("{}/api/v1/flows/catalog", self.base_url))
            .query(&[("intent", intent), ("module", module.unwrap_or_default()), ("message", message.unwrap_or_default())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if resp.is_null() {
            return Ok(None);
        }
        Ok(Some(FlowDefinition {
            flow_id: resp["flowId"].as_str().unwrap_or_default().to_string(),
            module: resp["module"].as_str().map(str::to_string),
        }))
    }

    async fn suspend_flow(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .post(format!("{}/api/v1/flows/suspend", self.base_url))
            .json(&serde_json::json!({ "key": key }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn cancel_flow(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .post(format!("{}/api/v1/flows/cancel", self.base_url))
            .json(&serde_json::json!({ "key": key }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn resume_suspended_flow(&self, key: &str) -> anyhow::Result<bool> {
        let resp: serde_json::Value = self
            .client
            .post(format!("{}/api/v1/flows/resume", self.base_url))
            .json(&serde_json::json!({ "key": key }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp["resumed"].as_bool().unwrap_or(false))
    }
}

fn parse_step_result(resp: serde_json::Value) -> anyhow::Result<FlowStepResult> {
    let buttons = resp["buttons"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|b| Some(crate::utils::buttons::Button::new(b["label"].as_str()?.to_string(), b["value"].as_str()?.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(FlowStepResult {
        response: resp["response"].as_str().unwrap_or_default().to_string(),
        buttons,
        metadata: resp.get("metadata").cloned().unwrap_or(serde_json::Value::Null),
        completed: resp["completed"].as_bool().unwrap_or(false),
    })
}
