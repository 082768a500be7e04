// src/orchestrator/keywords.rs
// Small lexicons the orchestrator's gates match against directly (spec
// §4.8 gates 4, 5, 10), kept separate from the regex-heavy C1-C5 modules
// since these are orchestrator-local, not reusable classifiers.

use once_cell::sync::Lazy;
use regex::Regex;

static RESTART_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(start again|restart|start over|cancel everything)\b").unwrap());

static GREETING_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(hi|hello|hey|namaste|yo)\b").unwrap());

static EXPLICIT_CANCEL_KEYWORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(cancel|stop|never ?mind)\b").unwrap());

pub fn is_restart_message(message: &str) -> bool {
    RESTART_KEYWORDS.is_match(message)
}

pub fn is_greeting_message(message: &str) -> bool {
    GREETING_KEYWORDS.is_match(message)
}

pub fn is_explicit_short_cancel(message: &str) -> bool {
    message.chars().count() < 20 && EXPLICIT_CANCEL_KEYWORDS.is_match(message)
}

const YES_LEXICON: &[&str] = &["yes", "resume", "sure", "ok", "okay", "ha", "ho", "haan"];

pub fn is_resume_yes(message: &str) -> bool {
    let lower = message.trim().to_lowercase();
    YES_LEXICON.iter().any(|w| lower == *w || lower.starts_with(&format!("{w} ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_restart_phrasing() {
        assert!(is_restart_message("start again"));
        assert!(is_restart_message("I want to restart"));
        assert!(!is_restart_message("start my order"));
    }

    #[test]
    fn recognizes_greeting_at_message_start() {
        assert!(is_greeting_message("hi there"));
        assert!(!is_greeting_message("this is not a greeting hi"));
    }

    #[test]
    fn yes_lexicon_matches_variants() {
        assert!(is_resume_yes("yes"));
        assert!(is_resume_yes("Ha"));
        assert!(is_resume_yes("ok please"));
        assert!(!is_resume_yes("no thanks"));
    }
}
