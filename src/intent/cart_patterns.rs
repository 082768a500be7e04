// src/intent/cart_patterns.rs
// Cart pattern match — precedence 3 in spec §4.5. Regex families for
// remove/clear/view/update-quantity, confidence 0.95.

use super::types::Intent;
use once_cell::sync::Lazy;
use regex::Regex;

static REMOVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(remove|delete|take out)\b.*\b(from (the |my )?cart|item)\b").unwrap());
static CLEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(clear|empty)\b.*\bcart\b").unwrap());
static VIEW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(view|show|see|check)\b.*\bcart\b").unwrap());
static UPDATE_QTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(change|update|set)\b.*\bquantity\b|\bmake it (\d+)\b").unwrap()
});

pub fn classify(message: &str) -> Option<Intent> {
    if CLEAR.is_match(message) {
        return Some(Intent::RemoveFromCart);
    }
    if REMOVE.is_match(message) {
        return Some(Intent::RemoveFromCart);
    }
    if UPDATE_QTY.is_match(message) {
        return Some(Intent::UpdateQuantity);
    }
    if VIEW.is_match(message) {
        return Some(Intent::ViewCart);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_cart_detected() {
        assert_eq!(classify("show my cart"), Some(Intent::ViewCart));
    }

    #[test]
    fn remove_detected() {
        assert_eq!(classify("remove pizza from the cart"), Some(Intent::RemoveFromCart));
    }

    #[test]
    fn clear_classified_as_remove() {
        assert_eq!(classify("clear my cart"), Some(Intent::RemoveFromCart));
    }

    #[test]
    fn update_quantity_detected() {
        assert_eq!(classify("change quantity to 3"), Some(Intent::UpdateQuantity));
    }
}
