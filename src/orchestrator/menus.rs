// src/orchestrator/menus.rs
// Canned menu copy for the clarification and game-intent gates (spec §4.8
// gates 11, 13).

use crate::intent::nlu::NluClassification;
use crate::utils::buttons::Button;

pub struct Menu {
    pub text: String,
    pub buttons: Vec<Button>,
}

pub fn smart_clarification(nlu: &NluClassification) -> Menu {
    let mut text = String::from("I want to make sure I get this right — which of these did you mean?");
    let mut buttons = vec![];
    for option in &nlu.clarification_options {
        buttons.push(Button::new(option.clone(), option.clone()));
    }
    if buttons.is_empty() {
        text = "Could you tell me a bit more about what you're looking for?".to_string();
    }
    Menu { text, buttons }
}

pub fn generic_help_menu() -> Menu {
    Menu {
        text: "I'm not sure I understood that. Here's what I can help with:".to_string(),
        buttons: vec![
            Button::new("Order food", "order_food"),
            Button::new("Search products", "search_product"),
            Button::new("Send a parcel", "parcel_booking"),
            Button::new("Track my order", "track_order"),
            Button::new("Talk to a human", "human"),
        ],
    }
}

pub fn game_intent_response(intent: &crate::intent::types::Intent) -> Menu {
    use crate::intent::types::Intent;
    let text = match intent {
        Intent::PlayGame | Intent::GameIntro => "Let's play! I'll set up a quick game for you.",
        Intent::ClaimReward => "Let's see what rewards you can claim right now.",
        Intent::ViewRewards => "Here are your current rewards.",
        Intent::CheckPoints => "Checking your points balance.",
        Intent::Leaderboard => "Here's today's leaderboard.",
        _ => "Let's play!",
    };
    Menu { text: text.to_string(), buttons: vec![] }
}
