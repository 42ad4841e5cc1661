//! Voice catalog: model variants, preset speakers, supported languages.

mod variant;

pub use variant::{parse_voice_variant, ParseVoiceVariantError, VoiceVariant};

/// Preset speakers supported by the CustomVoice model.
pub const SPEAKERS: &[&str] = &[
    "Vivian", "Serena", "Uncle_Fu", "Dylan", "Eric", "Ryan", "Aiden", "Ono_Anna", "Sohee",
];

/// Languages accepted by all variants. "Auto" lets the model detect.
pub const LANGUAGES: &[&str] = &[
    "Auto",
    "Chinese",
    "English",
    "Japanese",
    "Korean",
    "German",
    "French",
    "Russian",
    "Portuguese",
    "Spanish",
    "Italian",
];

pub fn speakers() -> Vec<String> {
    SPEAKERS.iter().map(|s| s.to_string()).collect()
}

pub fn languages() -> Vec<String> {
    LANGUAGES.iter().map(|s| s.to_string()).collect()
}

pub fn is_known_speaker(name: &str) -> bool {
    SPEAKERS.iter().any(|s| s.eq_ignore_ascii_case(name))
}

pub fn is_known_language(name: &str) -> bool {
    LANGUAGES.iter().any(|s| s.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speaker_lookup_is_case_insensitive() {
        assert!(is_known_speaker("vivian"));
        assert!(is_known_speaker("Uncle_Fu"));
        assert!(!is_known_speaker("Nobody"));
    }

    #[test]
    fn auto_language_is_known() {
        assert!(is_known_language("Auto"));
        assert!(is_known_language("english"));
        assert!(!is_known_language("Klingon"));
    }
}
