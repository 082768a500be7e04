// src/flow/types.rs
// Flow handle (spec §3, GLOSSARY) — opaque to the core; only the Flow
// Dispatcher interprets it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowHandle {
    pub flow_id: String,
    pub flow_run_id: String,
    pub current_state_id: String,
}

#[derive(Debug, Clone)]
pub struct FlowStepResult {
    pub response: String,
    pub buttons: Vec<crate::utils::buttons::Button>,
    pub metadata: serde_json::Value,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct FlowDefinition {
    pub flow_id: String,
    pub module: Option<String>,
}
