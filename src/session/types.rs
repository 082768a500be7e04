// src/session/types.rs
// Session (spec §3). Per the design notes (§9), the mutual-exclusion
// invariant ("at most one of {active flow, awaiting-auth, awaiting-resume,
// escalated} may drive the next reply") is enforced statically with a
// tagged `ConversationMode` instead of four independent booleans/options.

use crate::flow::types::FlowHandle;
use crate::intent::types::RoutingResult;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStep {
    AwaitingPhoneNumber,
    AwaitingOtp,
    AwaitingName,
    AwaitingEmail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingIntent {
    pub intent: RoutingResult,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPending {
    pub step: AuthStep,
    pub pending_action: Option<String>,
    pub pending_module: Option<String>,
    pub pending_intent: Option<PendingIntent>,
    pub temp_phone: Option<String>,
    pub temp_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationTicket {
    pub frappe_issue_id: String,
}

/// Exactly one conversation mode drives the next reply, enforced at the
/// type level rather than by four separately-settable booleans (spec §9
/// design notes, §3 invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConversationMode {
    Idle,
    Authenticating(AuthPending),
    InFlow(FlowHandle),
    AwaitingResumeConfirmation { suspended_flow: FlowHandle },
    EscalatedToHuman(EscalationTicket),
}

impl Default for ConversationMode {
    fn default() -> Self {
        ConversationMode::Idle
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub last_location_update_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub message: String,
    pub response: String,
    pub intent: Option<String>,
    pub timestamp_ms: i64,
}

const MAX_HISTORY: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub key: String,
    pub mode: ConversationMode,
    pub authenticated: bool,
    pub user_id: Option<i64>,
    pub auth_token: Option<String>,
    pub language: Option<String>,
    pub module: Option<String>,
    pub location: Option<Location>,
    pub zone_id: Option<i64>,
    pub zone_name: Option<String>,
    pub detected_language: Option<String>,
    pub history: VecDeque<HistoryTurn>,
    pub handoff_depth: u32,
    /// Survives the `Authenticating` mode so gate 8 (spec §4.8) can restore
    /// it once auth completes and `mode` has already gone back to `Idle`.
    pub pending_intent: Option<PendingIntent>,
}

impl Session {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            mode: ConversationMode::Idle,
            authenticated: false,
            user_id: None,
            auth_token: None,
            language: None,
            module: None,
            location: None,
            zone_id: None,
            zone_name: None,
            detected_language: None,
            history: VecDeque::new(),
            handoff_depth: 0,
            pending_intent: None,
        }
    }

    pub fn push_history(&mut self, turn: HistoryTurn) {
        self.history.push_back(turn);
        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
    }

    pub fn is_awaiting_auth_step(&self, step: &AuthStep) -> bool {
        matches!(&self.mode, ConversationMode::Authenticating(p) if &p.step == step)
    }
}
