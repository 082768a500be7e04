// src/handoff/types.rs
// HandoffRequest (spec §3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Frappe priority mapping (spec §4.8.2).
    pub fn frappe_priority(&self) -> &'static str {
        match self {
            Priority::Critical => "Urgent",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

/// `targetAgent (agent | "human")` of spec §3 — a plain string rather than
/// an enum, since the set of valid agent ids is the open agent registry,
/// not a closed vocabulary; `"human"` is the one reserved value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffTarget(pub String);

impl HandoffTarget {
    pub const HUMAN: &'static str = "human";

    pub fn is_human(&self) -> bool {
        self.0 == Self::HUMAN
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffContext {
    pub user_message: String,
    pub extracted_data: serde_json::Value,
    pub conversation_summary: Option<String>,
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandoffOptions {
    pub send_transition_message: Option<bool>,
    pub transition_message: Option<String>,
    pub require_acknowledgment: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub allow_bounceback: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffRequest {
    pub source_agent: String,
    pub target: HandoffTarget,
    pub reason: String,
    pub context: HandoffContext,
    pub options: HandoffOptions,
}
