// src/intent/nlu.rs
// Remote NLU classification — precedence 4 in spec §4.5. Modeled as a
// trait object per §9 ("LLM / external calls... a capability the core
// consumes"), mirroring the teacher's `LlmProvider` trait split.

use super::types::Intent;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

pub const NLU_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone)]
pub struct NluContext {
    pub active_module: Option<String>,
    pub active_flow_id: Option<String>,
    pub last_bot_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NluClassification {
    pub intent: Intent,
    pub confidence: f32,
    pub entities: HashMap<String, Value>,
    pub raw: Option<Value>,
    /// Present when the classifier itself flags ambiguity (spec §4.8 gate 11).
    pub needs_clarification: bool,
    pub clarification_options: Vec<String>,
}

#[async_trait]
pub trait NluClassifier: Send + Sync {
    async fn classify(&self, message: &str, context: &NluContext) -> anyhow::Result<NluClassification>;
}

pub struct HttpNluClassifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNluClassifier {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(NLU_TIMEOUT).build().expect("reqwest client"),
            base_url,
        }
    }
}

#[async_trait]
impl NluClassifier for HttpNluClassifier {
    async fn classify(&self, message: &str, context: &NluContext) -> anyhow::Result<NluClassification> {
        let body = serde_json::json!({
            "message": message,
            "active_module": context.active_module,
            "active_flow_id": context.active_flow_id,
            "last_bot_message": context.last_bot_message,
        });

        let resp: serde_json::Value = self
            .client
            .post(format!("{}/classify", self.base_url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let intent_str = resp.get("intent").and_then(|v| v.as_str()).unwrap_or("unknown");
        let intent = parse_intent(intent_str);
        let confidence = resp.get("confidence").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
        let entities = resp
            .get("entities")
            .and_then(|v| v.as_object())
            .map(|o| o.clone().into_iter().collect())
            .unwrap_or_default();

        Ok(NluClassification {
            intent,
            confidence,
            entities,
            raw: Some(resp.clone()),
            needs_clarification: resp.get("needs_clarification").and_then(|v| v.as_bool()).unwrap_or(false),
            clarification_options: resp
                .get("clarification_options")
                .and_then(|v| v.as_array())
                .map(|a| a.iter().filter_map(|x| x.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
        })
    }
}

pub fn parse_intent(s: &str) -> Intent {
    match s {
        "greeting" => Intent::Greeting,
        "chitchat" => Intent::Chitchat,
        "farewell" => Intent::Farewell,
        "feedback" => Intent::Feedback,
        "help" => Intent::Help,
        "cancel" => Intent::Cancel,
        "reset" => Intent::Reset,
        "start_over" => Intent::StartOver,
        "main_menu" => Intent::MainMenu,
        "login" => Intent::Login,
        "play_game" => Intent::PlayGame,
        "claim_reward" => Intent::ClaimReward,
        "view_rewards" => Intent::ViewRewards,
        "check_points" => Intent::CheckPoints,
        "leaderboard" => Intent::Leaderboard,
        "game_intro" => Intent::GameIntro,
        "order_food" => Intent::OrderFood,
        "browse_menu" => Intent::BrowseMenu,
        "search_product" => Intent::SearchProduct,
        "add_to_cart" => Intent::AddToCart,
        "remove_from_cart" => Intent::RemoveFromCart,
        "view_cart" => Intent::ViewCart,
        "update_quantity" => Intent::UpdateQuantity,
        "checkout" => Intent::Checkout,
        "track_order" => Intent::TrackOrder,
        "cancel_order" => Intent::CancelOrder,
        "reorder" => Intent::Reorder,
        "repeat_order" => Intent::RepeatOrder,
        "book_parcel" => Intent::BookParcel,
        "parcel_booking" => Intent::ParcelBooking,
        "create_parcel_order" => Intent::CreateParcelOrder,
        "schedule_delivery" => Intent::ScheduleDelivery,
        "refund_request" => Intent::RefundRequest,
        "submit_complaint" => Intent::SubmitComplaint,
        "manage_address" => Intent::ManageAddress,
        "view_profile" => Intent::ViewProfile,
        "view_orders" => Intent::ViewOrders,
        "needs_clarification" => Intent::NeedsClarification,
        _ => Intent::Unknown,
    }
}
