// src/intent/compound_patterns.rs
// Compound-intent pattern fallback — precedence 5 in spec §4.5. Tried only
// when NLU returns unknown, low confidence, or the message has a
// multi-intent separator.

use super::types::Intent;
use once_cell::sync::Lazy;
use regex::Regex;

static MULTI_INTENT_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(and then|also|,\s*and|;)\b").unwrap());

pub fn has_multi_intent_separator(message: &str) -> bool {
    MULTI_INTENT_SEPARATOR.is_match(message)
}

struct ActionIntent {
    intent: Intent,
    keyword_families: &'static [&'static [&'static str]],
    /// When true, a single hit from any family suffices (explicit
    /// parcel/delivery vocabulary per spec §4.5); otherwise ≥2 hits across
    /// families are required.
    single_hit_suffices: bool,
}

static ACTION_INTENTS: &[ActionIntent] = &[
    ActionIntent {
        intent: Intent::OrderFood,
        keyword_families: &[&["order", "buy", "get me"], &["food", "biryani", "pizza", "meal", "lunch", "dinner"]],
        single_hit_suffices: false,
    },
    ActionIntent {
        intent: Intent::SearchProduct,
        keyword_families: &[&["search", "find", "show me", "looking for"], &["product", "item", "store", "shop"]],
        single_hit_suffices: false,
    },
    ActionIntent {
        intent: Intent::ParcelBooking,
        keyword_families: &[&["parcel", "courier", "send a package", "book delivery"]],
        single_hit_suffices: true,
    },
    ActionIntent {
        intent: Intent::TrackOrder,
        keyword_families: &[&["track", "where is", "status of"], &["order", "delivery", "parcel"]],
        single_hit_suffices: false,
    },
    ActionIntent {
        intent: Intent::CancelOrder,
        keyword_families: &[&["cancel"], &["order"]],
        single_hit_suffices: false,
    },
    ActionIntent {
        intent: Intent::Reorder,
        keyword_families: &[&["reorder", "repeat", "order again", "same as last time"]],
        single_hit_suffices: true,
    },
    ActionIntent {
        intent: Intent::RefundRequest,
        keyword_families: &[&["refund", "money back"], &["order", "payment"]],
        single_hit_suffices: false,
    },
    ActionIntent {
        intent: Intent::ScheduleDelivery,
        keyword_families: &[&["schedule", "book a slot", "deliver later"]],
        single_hit_suffices: true,
    },
    ActionIntent {
        intent: Intent::Login,
        keyword_families: &[&["login", "log in", "sign in"]],
        single_hit_suffices: true,
    },
];

pub fn classify(message: &str) -> Option<Intent> {
    let lower = message.to_lowercase();

    for action in ACTION_INTENTS {
        let families_hit = action.keyword_families.iter().filter(|fam| fam.iter().any(|kw| lower.contains(kw))).count();

        if action.single_hit_suffices {
            if families_hit >= 1 {
                return Some(action.intent.clone());
            }
        } else if families_hit >= 2 {
            return Some(action.intent.clone());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_food_needs_two_family_hits() {
        assert_eq!(classify("order biryani"), Some(Intent::OrderFood));
        assert_eq!(classify("order"), None);
    }

    #[test]
    fn parcel_vocabulary_single_hit_suffices() {
        assert_eq!(classify("book delivery"), Some(Intent::ParcelBooking));
    }

    #[test]
    fn detects_multi_intent_separator() {
        assert!(has_multi_intent_separator("order food and then track my last order"));
        assert!(!has_multi_intent_separator("order food please"));
    }
}
