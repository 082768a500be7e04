// src/intent/gamification.rs
// Gamification shortcuts — precedence 1 in spec §4.5. Exact/substring
// matches on a small lexicon, always confidence 1.0.

static LEXICON: &[&str] = &["play game", "rewards", "play a game", "my rewards", "reward points"];

pub fn matches(message: &str) -> bool {
    let lower = message.to_lowercase();
    LEXICON.iter().any(|l| lower.contains(l))
}
