// src/utils/phone.rs
// Participant-id phone sniffing (spec §6, §9 open question 2). Strips known
// transport prefixes, then checks whether the remainder plausibly looks
// like an E.164/IN phone number, purely for personalization-without-auth
// lookups — never for authentication itself.

const KNOWN_PREFIXES: &[&str] = &["web-", "whatsapp-", "test-", "sess-"];

pub fn strip_transport_prefix(participant_id: &str) -> &str {
    for prefix in KNOWN_PREFIXES {
        if let Some(rest) = participant_id.strip_prefix(prefix) {
            return rest;
        }
    }
    participant_id
}

/// Loose E.164/IN check: optional leading `+`, optional country code `91`,
/// then 10 digits, nothing else.
pub fn looks_like_phone_number(s: &str) -> bool {
    let s = s.trim().strip_prefix('+').unwrap_or(s.trim());
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != s.len() {
        return false;
    }
    match digits.len() {
        10 => true,
        12 => digits.starts_with("91"),
        _ => false,
    }
}

pub fn participant_looks_like_phone(participant_id: &str) -> bool {
    looks_like_phone_number(strip_transport_prefix(participant_id))
}

pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_known_prefixes() {
        assert_eq!(strip_transport_prefix("whatsapp-919876543210"), "919876543210");
        assert_eq!(strip_transport_prefix("web-abc123"), "abc123");
    }

    #[test]
    fn recognizes_in_phone_numbers() {
        assert!(participant_looks_like_phone("whatsapp-9876543210"));
        assert!(participant_looks_like_phone("whatsapp-919876543210"));
        assert!(!participant_looks_like_phone("web-session-abc-123"));
    }
}
