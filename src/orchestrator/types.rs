// src/orchestrator/types.rs
// `processMessage` entry-point contract (spec §6).

use crate::utils::buttons::Button;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ProcessMessageRequest {
    pub participant_id: String,
    pub message: String,
    pub module: Option<String>,
    pub image_url: Option<String>,
    /// Supplied by tests to inject a session directly instead of loading
    /// from the store (spec §6 `testSession`).
    pub test_session: Option<crate::session::Session>,
    pub user_preference_context: Option<Value>,
}

impl ProcessMessageRequest {
    pub fn new(participant_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            message: message.into(),
            module: None,
            image_url: None,
            test_session: None,
            user_preference_context: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessMessageResponse {
    pub response: String,
    pub buttons: Vec<Button>,
    pub execution_time_ms: u64,
    pub metadata: Value,
}

impl ProcessMessageResponse {
    pub fn text(response: impl Into<String>, execution_time_ms: u64) -> Self {
        Self { response: response.into(), buttons: vec![], execution_time_ms, metadata: Value::Null }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }
}
