// src/language.rs
// C2: Language Detector (spec §4.2). Script-dominance classifier over a
// small set of recognized Unicode blocks, with lexical overrides for
// Hinglish and Marathi.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageAnnotation {
    pub language: String,
    pub script: &'static str,
    pub confidence: f32,
    pub instruction: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Latin,
    Devanagari,
    Other,
}

fn classify_char(c: char) -> Option<Script> {
    match c as u32 {
        0x0041..=0x005A | 0x0061..=0x007A => Some(Script::Latin),
        0x0900..=0x097F => Some(Script::Devanagari),
        0x0980..=0x09FF | 0x0A00..=0x0A7F | 0x0A80..=0x0AFF | 0x0B00..=0x0B7F | 0x0B80..=0x0BFF
        | 0x0C00..=0x0C7F | 0x0C80..=0x0CFF | 0x0D00..=0x0D7F => Some(Script::Other),
        _ => None,
    }
}

static HINGLISH_LEXEMES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(kya|hai|nahi|nahin|acha|theek|kaise|kitna|bhai|bhej|dikhao|chahiye|karo|kar do|mujhe)\b").unwrap()
});

static MARATHI_LEXEMES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(काय|आहे|मला|पाहिजे|करा|कुठे)").unwrap());

/// `analyze(text) -> LanguageAnnotation`.
pub fn analyze(text: &str) -> LanguageAnnotation {
    let mut latin = 0usize;
    let mut devanagari = 0usize;
    let mut other = 0usize;
    let mut recognized = 0usize;

    for c in text.chars() {
        if let Some(s) = classify_char(c) {
            recognized += 1;
            match s {
                Script::Latin => latin += 1,
                Script::Devanagari => devanagari += 1,
                Script::Other => other += 1,
            }
        }
    }

    if recognized == 0 {
        return instructioned(LanguageAnnotation {
            language: "en".to_string(),
            script: "latin",
            confidence: 0.5,
            instruction: String::new(),
        });
    }

    let total = recognized as f32;
    let shares = [
        ("latin", latin as f32 / total),
        ("devanagari", devanagari as f32 / total),
        ("other", other as f32 / total),
    ];

    let (dominant_script, dominant_share) = shares
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .copied()
        .unwrap();

    let minor_share_threshold = 0.2;
    let scripts_above_threshold = shares.iter().filter(|(_, s)| *s >= minor_share_threshold).count();

    if scripts_above_threshold >= 2 && dominant_share < 0.7 {
        return instructioned(LanguageAnnotation {
            language: "mixed".to_string(),
            script: "mixed",
            confidence: dominant_share,
            instruction: String::new(),
        });
    }

    let language = match dominant_script {
        "latin" => {
            if HINGLISH_LEXEMES.is_match(text) {
                "hinglish"
            } else {
                "en"
            }
        }
        "devanagari" => {
            if MARATHI_LEXEMES.is_match(text) {
                "mr"
            } else {
                "hi"
            }
        }
        "other" => "regional_indic",
        _ => "en",
    };

    instructioned(LanguageAnnotation {
        language: language.to_string(),
        script: dominant_script,
        confidence: dominant_share,
        instruction: String::new(),
    })
}

fn instructioned(mut annotation: LanguageAnnotation) -> LanguageAnnotation {
    annotation.instruction = match annotation.language.as_str() {
        "hi" => "Respond in Hindi (Devanagari script) unless the user switches language.".to_string(),
        "mr" => "Respond in Marathi (Devanagari script) unless the user switches language.".to_string(),
        "hinglish" => "Respond in Hinglish (romanized, conversational Hindi-English mix).".to_string(),
        "mixed" => "The user is mixing scripts/languages; mirror their most recent message's language.".to_string(),
        "regional_indic" => "The user is writing in a regional Indic script this detector doesn't further distinguish; mirror their script and ask for English or Hindi if unsure.".to_string(),
        _ => "Respond in English unless the user switches language.".to_string(),
    };
    annotation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_english_is_en() {
        assert_eq!(analyze("where is my order").language, "en");
    }

    #[test]
    fn hinglish_lexemes_flip_latin_script() {
        assert_eq!(analyze("mera order kaha hai bhai").language, "hinglish");
    }

    #[test]
    fn devanagari_without_marathi_lexemes_is_hindi() {
        assert_eq!(analyze("मेरा ऑर्डर कहाँ है").language, "hi");
    }

    #[test]
    fn devanagari_with_marathi_lexemes_is_marathi() {
        assert_eq!(analyze("मला ऑर्डर पाहिजे आहे").language, "mr");
    }

    #[test]
    fn bengali_script_is_regional_indic_not_english() {
        assert_eq!(analyze("আমার অর্ডার কোথায়").language, "regional_indic");
    }

    #[test]
    fn no_recognizable_chars_defaults_english_half_confidence() {
        let a = analyze("12345 !!!");
        assert_eq!(a.language, "en");
        assert_eq!(a.confidence, 0.5);
    }
}
