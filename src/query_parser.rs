// src/query_parser.rs
// C3: Query Parser (spec §4.3). Extracts structured filters from a free-text
// query and strips the recognized fragments out of `cleanQuery`.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedQuery {
    pub clean_query: String,
    pub veg: Option<bool>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub category: Option<&'static str>,
    pub rating: Option<f32>,
    pub target_module: Option<&'static str>,
}

struct ModuleKeyword {
    words: &'static [&'static str],
    module: &'static str,
}

static MODULE_KEYWORDS: &[ModuleKeyword] = &[
    ModuleKeyword { words: &["dukan", "kirana", "grocery", "store"], module: "ecom" },
    ModuleKeyword { words: &["pharmacy", "medicine", "medical store"], module: "pharmacy" },
    ModuleKeyword { words: &["restaurant", "food", "cafe", "dhaba"], module: "food" },
];

static VEG_KEYWORDS: &[&str] = &["veg", "vegetarian", "pure veg"];
static NON_VEG_KEYWORDS: &[&str] =
    &["chicken", "mutton", "fish", "egg", "non-veg", "non veg", "beef", "pork", "prawn"];

static FILLER_PHRASES: &[&str] =
    &["show me", "find", "search", "i want", "looking for", "i'm looking for"];

struct CuisineKeyword {
    words: &'static [&'static str],
    category: &'static str,
}

static CUISINES: &[CuisineKeyword] = &[
    CuisineKeyword { words: &["chinese"], category: "chinese" },
    CuisineKeyword { words: &["italian", "pizza", "pasta"], category: "italian" },
    CuisineKeyword { words: &["indian", "north indian", "south indian"], category: "indian" },
    CuisineKeyword { words: &["mexican", "taco", "burrito"], category: "mexican" },
    CuisineKeyword { words: &["fast food", "burger"], category: "fast-food" },
    CuisineKeyword { words: &["dessert", "sweet", "cake", "ice cream"], category: "dessert" },
];

static UNDER_PRICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:under|below|max|upto|up to)\s*(?:rs\.?|₹)?\s*(\d+(?:\.\d+)?)").unwrap());
static ABOVE_PRICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:above|min|from)\s*(?:rs\.?|₹)?\s*(\d+(?:\.\d+)?)").unwrap());
static BETWEEN_PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bbetween\s*(?:rs\.?|₹)?\s*(\d+(?:\.\d+)?)\s*(?:and|to)\s*(?:rs\.?|₹)?\s*(\d+(?:\.\d+)?)").unwrap()
});
static RATING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)rated?\s*(?:above|over|at least|>=)?\s*(\d(?:\.\d)?)\s*\+?\s*stars?").unwrap());

/// `parse(query) -> ParsedQuery`.
pub fn parse(query: &str) -> ParsedQuery {
    let mut result = ParsedQuery::default();
    let mut remaining = query.to_string();
    let lower = query.to_lowercase();

    for kw in MODULE_KEYWORDS {
        for word in kw.words {
            if lower.contains(word) {
                result.target_module = Some(kw.module);
                remaining = strip_ci(&remaining, word);
                break;
            }
        }
        if result.target_module.is_some() {
            break;
        }
    }

    if VEG_KEYWORDS.iter().any(|w| lower.contains(w)) {
        result.veg = Some(true);
    }
    // Non-veg keywords are detected anywhere but never stripped (spec §4.3).
    if NON_VEG_KEYWORDS.iter().any(|w| lower.contains(w)) {
        result.veg = Some(false);
    }

    // First price pattern to match wins: between > under/max > above/min.
    if let Some(caps) = BETWEEN_PRICE.captures(&remaining) {
        result.price_min = caps.get(1).and_then(|m| m.as_str().parse().ok());
        result.price_max = caps.get(2).and_then(|m| m.as_str().parse().ok());
        remaining = BETWEEN_PRICE.replace(&remaining, "").to_string();
    } else if let Some(caps) = UNDER_PRICE.captures(&remaining) {
        result.price_max = caps.get(1).and_then(|m| m.as_str().parse().ok());
        remaining = UNDER_PRICE.replace(&remaining, "").to_string();
    } else if let Some(caps) = ABOVE_PRICE.captures(&remaining) {
        result.price_min = caps.get(1).and_then(|m| m.as_str().parse().ok());
        remaining = ABOVE_PRICE.replace(&remaining, "").to_string();
    }

    if let Some(caps) = RATING.captures(&remaining) {
        result.rating = caps.get(1).and_then(|m| m.as_str().parse().ok());
        remaining = RATING.replace(&remaining, "").to_string();
    }

    let remaining_lower = remaining.to_lowercase();
    for cuisine in CUISINES {
        if cuisine.words.iter().any(|w| remaining_lower.contains(w)) {
            result.category = Some(cuisine.category);
            if result.target_module.is_none() {
                result.target_module = Some("food");
            }
            break;
        }
    }

    for phrase in FILLER_PHRASES {
        remaining = strip_ci(&remaining, phrase);
    }

    result.clean_query = remaining.split_whitespace().collect::<Vec<_>>().join(" ").trim().to_string();
    result
}

/// Case-insensitive whole-phrase strip, collapsing the resulting whitespace gap.
fn strip_ci(haystack: &str, needle: &str) -> String {
    let lower = haystack.to_lowercase();
    if let Some(idx) = lower.find(&needle.to_lowercase()) {
        let mut out = String::with_capacity(haystack.len());
        out.push_str(&haystack[..idx]);
        out.push_str(&haystack[idx + needle.len()..]);
        out
    } else {
        haystack.to_string()
    }
}

/// Merges caller-supplied args with parsed filters with user-profile
/// defaults, per the precedence in spec §4.3: caller > parsed > profile.
pub fn merge_veg(caller: Option<bool>, parsed: Option<bool>, profile_veg: Option<bool>) -> Option<bool> {
    caller.or(parsed).or(profile_veg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_module_keyword_and_sets_target() {
        let p = parse("find grocery store near me");
        assert_eq!(p.target_module, Some("ecom"));
        assert!(!p.clean_query.contains("grocery"));
    }

    #[test]
    fn non_veg_keyword_not_stripped() {
        let p = parse("chicken biryani under 200");
        assert_eq!(p.veg, Some(false));
        assert!(p.clean_query.contains("chicken"));
        assert_eq!(p.price_max, Some(200.0));
    }

    #[test]
    fn between_sets_both_bounds() {
        let p = parse("pizza between 100 and 300");
        assert_eq!(p.price_min, Some(100.0));
        assert_eq!(p.price_max, Some(300.0));
    }

    #[test]
    fn cuisine_without_module_defaults_food() {
        let p = parse("looking for italian food");
        assert_eq!(p.category, Some("italian"));
        assert_eq!(p.target_module, Some("food"));
    }

    #[test]
    fn rating_filter_extracted() {
        let p = parse("restaurants rated above 4 stars");
        assert_eq!(p.rating, Some(4.0));
    }

    #[test]
    fn filler_phrases_stripped() {
        let p = parse("show me veg pizza");
        assert_eq!(p.clean_query, "pizza");
    }
}
