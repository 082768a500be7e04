// src/content_filter.rs
// C1: Content Filter — the first gate of the orchestrator (spec §4.1, §4.8
// gate 1). Synchronous, no session I/O, runs before anything else touches
// the store.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    Profanity,
    AdultContent,
    HarmfulContent,
    OffTopic,
    Spam,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::Profanity => "profanity",
            BlockReason::AdultContent => "adult_content",
            BlockReason::HarmfulContent => "harmful_content",
            BlockReason::OffTopic => "off_topic",
            BlockReason::Spam => "spam",
        }
    }

    /// Canned bilingual reply for this reason.
    pub fn canned_response(&self) -> &'static str {
        match self {
            BlockReason::Profanity => {
                "Let's keep this conversation respectful. / कृपया सम्मानजनक भाषा का प्रयोग करें।"
            }
            BlockReason::AdultContent => {
                "I can't help with that here. / मैं इसमें मदद नहीं कर सकता।"
            }
            BlockReason::HarmfulContent => {
                "I can't assist with that request. / मैं इस अनुरोध में सहायता नहीं कर सकता।"
            }
            BlockReason::OffTopic => {
                "I can help with orders, deliveries and local shopping — let's stick to that. / मैं ऑर्डर और डिलीवरी में मदद कर सकता हूँ।"
            }
            BlockReason::Spam => {
                "That message doesn't look like something I can act on. / यह संदेश समझ नहीं आया।"
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterVerdict {
    pub blocked: bool,
    pub reason: Option<BlockReason>,
    pub response: Option<String>,
}

impl FilterVerdict {
    fn allow() -> Self {
        Self { blocked: false, reason: None, response: None }
    }

    fn block(reason: BlockReason) -> Self {
        Self { blocked: true, reason: Some(reason), response: Some(reason.canned_response().to_string()) }
    }
}

static PROFANITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(fuck|bitch|madarchod|bhenchod|chutiya|asshole)\b").unwrap()
});

static ADULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(porn|nude|xxx|sex video)\b").unwrap());

static HARMFUL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(kill myself|suicide|make a bomb|how to hack)\b").unwrap()
});

/// Competitor names are logged but never blocked (spec §4.1).
static COMPETITOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(swiggy|zomato|blinkit|zepto|bigbasket)\b").unwrap());

/// `filter(message) -> FilterVerdict`. Pure, synchronous, zero I/O.
pub fn filter(message: &str) -> FilterVerdict {
    let trimmed = message.trim();

    if trimmed.chars().count() < 2 {
        return FilterVerdict::allow();
    }

    if let Some(m) = COMPETITOR.find(trimmed) {
        tracing::info!(competitor = %m.as_str(), "competitor mention observed, not blocking");
    }

    if HARMFUL.is_match(trimmed) {
        return FilterVerdict::block(BlockReason::HarmfulContent);
    }
    if ADULT.is_match(trimmed) {
        return FilterVerdict::block(BlockReason::AdultContent);
    }
    if PROFANITY.is_match(trimmed) {
        return FilterVerdict::block(BlockReason::Profanity);
    }

    if trimmed.chars().count() > 200 && !trimmed.chars().any(|c| c.is_whitespace()) {
        return FilterVerdict::block(BlockReason::Spam);
    }

    FilterVerdict::allow()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_short_messages_without_inspection() {
        assert!(!filter("hi").blocked);
        assert!(!filter("a").blocked);
        assert!(!filter("").blocked);
    }

    #[test]
    fn blocks_harmful_before_profanity() {
        let v = filter("i want to kill myself and also fuck this");
        assert_eq!(v.reason, Some(BlockReason::HarmfulContent));
    }

    #[test]
    fn flags_long_whitespace_free_text_as_spam() {
        let long = "a".repeat(201);
        let v = filter(&long);
        assert_eq!(v.reason, Some(BlockReason::Spam));
    }

    #[test]
    fn long_message_with_spaces_is_not_spam() {
        let long = "order two plates of biryani and some raita please ".repeat(5);
        assert!(!filter(&long).blocked);
    }

    #[test]
    fn competitor_mentions_are_not_blocked() {
        assert!(!filter("is this cheaper than swiggy?").blocked);
    }
}
