// src/utils/buttons.rs
// Button payload syntax (spec §6): `[BUTTON:<label>:<value>]` markers
// embedded in responses, rewritten by the transport layer into native quick
// replies. Reserved values are `__LOCATION__` and `__LOGIN__`.

use serde::{Deserialize, Serialize};

pub const LOCATION_SHARE_VALUE: &str = "__LOCATION__";
pub const LOGIN_VALUE: &str = "__LOGIN__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub value: String,
}

impl Button {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into() }
    }

    pub fn location_share(label: impl Into<String>) -> Self {
        Self::new(label, LOCATION_SHARE_VALUE)
    }

    pub fn login(label: impl Into<String>) -> Self {
        Self::new(label, LOGIN_VALUE)
    }

    /// Renders the inline marker form so it can be embedded in a plain-text
    /// response body for transports that don't carry a separate buttons
    /// field.
    pub fn as_marker(&self) -> String {
        format!("[BUTTON:{}:{}]", self.label, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_format_matches_spec() {
        assert_eq!(Button::new("Yes", "yes").as_marker(), "[BUTTON:Yes:yes]");
    }
}
