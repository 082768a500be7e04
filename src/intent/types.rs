// src/intent/types.rs
// RoutingResult (spec §3) and the closed intent vocabulary (spec §6).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Chitchat,
    Farewell,
    Feedback,
    Help,
    Cancel,
    Reset,
    StartOver,
    MainMenu,
    Login,
    PlayGame,
    ClaimReward,
    ViewRewards,
    CheckPoints,
    Leaderboard,
    GameIntro,
    OrderFood,
    BrowseMenu,
    SearchProduct,
    AddToCart,
    RemoveFromCart,
    ViewCart,
    UpdateQuantity,
    Checkout,
    TrackOrder,
    CancelOrder,
    Reorder,
    RepeatOrder,
    BookParcel,
    ParcelBooking,
    CreateParcelOrder,
    ScheduleDelivery,
    RefundRequest,
    SubmitComplaint,
    ManageAddress,
    ViewProfile,
    ViewOrders,
    NeedsClarification,
    Unknown,
}

impl Intent {
    /// Intents that are never subject to the low-confidence/gibberish guard
    /// of spec §4.8 gate 11.
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Intent::Greeting
                | Intent::Chitchat
                | Intent::OrderFood
                | Intent::SearchProduct
                | Intent::ParcelBooking
                | Intent::TrackOrder
                | Intent::Farewell
                | Intent::Feedback
        )
    }

    /// The "escape intent" set of spec §4.8 gate 10 / GLOSSARY, allowed to
    /// interrupt any active flow.
    pub fn is_escape(&self) -> bool {
        matches!(
            self,
            Intent::Login | Intent::Cancel | Intent::Reset | Intent::Help | Intent::StartOver | Intent::MainMenu
        )
    }

    /// Short-allowed intents for the interruption check of spec §4.8 gate 9a.
    pub fn is_short_allowed_interrupt(&self) -> bool {
        matches!(self, Intent::Help | Intent::Cancel | Intent::MainMenu | Intent::Login)
            || matches!(self, Intent::Reset)
    }
}

/// Entities tolerate both a bare string and an array shape per the value
/// the router's upstream NLU happens to return (spec §9 open question 1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingResult {
    pub agent_id: String,
    pub agent_type: String,
    pub intent: Intent,
    pub entities: HashMap<String, Value>,
    pub confidence: f32,
    pub module_id: Option<String>,
    pub zone_id: Option<i64>,
    pub raw: Option<Value>,
    /// Set when the NLU flagged its own best-guess `intent` as ambiguous
    /// (spec §4.8 gate 11), independent of what `intent` actually is.
    pub needs_clarification: bool,
    pub clarification_options: Vec<String>,
}

impl Default for Intent {
    fn default() -> Self {
        Intent::Unknown
    }
}

impl RoutingResult {
    /// Tolerates an entity stored as either a bare string or a one-element
    /// array of strings.
    pub fn entity_str(&self, key: &str) -> Option<String> {
        match self.entities.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Array(arr) => arr.first().and_then(|v| v.as_str()).map(str::to_string),
            _ => None,
        }
    }

    pub fn entity_strs(&self, key: &str) -> Vec<String> {
        match self.entities.get(key) {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(arr)) => arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
            _ => Vec::new(),
        }
    }
}
