// src/intent/agent_mapping.rs
// Closed configuration table mapping intent -> agent type, with a FAQ
// fallback (spec §4.5 last paragraph).

use super::types::Intent;

pub fn agent_type_for(intent: &Intent) -> &'static str {
    match intent {
        Intent::OrderFood | Intent::BrowseMenu => "food_agent",
        Intent::SearchProduct => "search_agent",
        Intent::AddToCart | Intent::RemoveFromCart | Intent::ViewCart | Intent::UpdateQuantity | Intent::Checkout => {
            "cart_agent"
        }
        Intent::TrackOrder | Intent::CancelOrder | Intent::ViewOrders => "tracking_agent",
        Intent::Reorder | Intent::RepeatOrder => "reorder_agent",
        Intent::BookParcel | Intent::ParcelBooking | Intent::CreateParcelOrder | Intent::ScheduleDelivery => {
            "parcel_agent"
        }
        Intent::RefundRequest | Intent::SubmitComplaint => "complaints_agent",
        Intent::ManageAddress => "address_agent",
        Intent::ViewProfile => "profile_agent",
        Intent::PlayGame
        | Intent::ClaimReward
        | Intent::ViewRewards
        | Intent::CheckPoints
        | Intent::Leaderboard
        | Intent::GameIntro => "gamification_agent",
        Intent::Login => "auth_agent",
        Intent::Greeting | Intent::Chitchat | Intent::Farewell | Intent::Feedback | Intent::Help => "faq_agent",
        _ => "faq_agent",
    }
}

pub fn agent_id_for(intent: &Intent) -> String {
    format!("{}:default", agent_type_for(intent))
}
