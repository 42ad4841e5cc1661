//! Model variant identifiers and parser utilities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Service variants of the TTS model family.
///
/// Each variant maps to a distinct set of weights; at most one is resident
/// on the device at a time. The variant is resolved once at the API
/// boundary, so nothing past this point works with raw identifier strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceVariant {
    /// Preset-speaker synthesis with optional style instructions
    CustomVoice,
    /// Voices designed from a natural-language description
    VoiceDesign,
    /// Voice cloning from reference audio (base model)
    VoiceClone,
}

impl VoiceVariant {
    /// Default HuggingFace repository ID
    pub fn repo_id(&self) -> &'static str {
        match self {
            Self::CustomVoice => "Qwen/Qwen3-TTS-12Hz-1.7B-CustomVoice",
            Self::VoiceDesign => "Qwen/Qwen3-TTS-12Hz-1.7B-VoiceDesign",
            Self::VoiceClone => "Qwen/Qwen3-TTS-12Hz-1.7B-Base",
        }
    }

    /// Wire identifier used in API paths and config keys
    pub fn key(&self) -> &'static str {
        match self {
            Self::CustomVoice => "custom_voice",
            Self::VoiceDesign => "voice_design",
            Self::VoiceClone => "voice_clone",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CustomVoice => "Custom Voice",
            Self::VoiceDesign => "Voice Design",
            Self::VoiceClone => "Voice Clone",
        }
    }

    /// Get all variants
    pub fn all() -> &'static [VoiceVariant] {
        &[Self::CustomVoice, Self::VoiceDesign, Self::VoiceClone]
    }
}

impl fmt::Display for VoiceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone)]
pub struct ParseVoiceVariantError {
    input: String,
}

impl ParseVoiceVariantError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

impl fmt::Display for ParseVoiceVariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.input.trim().is_empty() {
            "<empty>"
        } else {
            self.input.trim()
        };
        write!(f, "Unsupported voice variant: {}", shown)
    }
}

impl std::error::Error for ParseVoiceVariantError {}

/// Parse a variant from a wire identifier, repo ID, or display name.
pub fn parse_voice_variant(input: &str) -> Result<VoiceVariant, ParseVoiceVariantError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseVoiceVariantError::new(input));
    }

    let normalized = normalize_identifier(trimmed);

    if let Some(found) = VoiceVariant::all()
        .iter()
        .copied()
        .find(|variant| matches_variant_alias(*variant, &normalized))
    {
        return Ok(found);
    }

    resolve_by_heuristic(&normalized).ok_or_else(|| ParseVoiceVariantError::new(input))
}

fn matches_variant_alias(variant: VoiceVariant, normalized: &str) -> bool {
    let repo = variant.repo_id();
    let repo_tail = repo.rsplit('/').next().unwrap_or(repo);

    let aliases = [variant.key(), repo, repo_tail, variant.display_name()];
    aliases
        .iter()
        .any(|alias| normalize_identifier(alias) == normalized)
}

fn resolve_by_heuristic(normalized: &str) -> Option<VoiceVariant> {
    if normalized.contains("customvoice") {
        return Some(VoiceVariant::CustomVoice);
    }
    if normalized.contains("voicedesign") || normalized.contains("design") {
        return Some(VoiceVariant::VoiceDesign);
    }
    if normalized.contains("voiceclone") || normalized.contains("clone") || normalized.ends_with("base")
    {
        return Some(VoiceVariant::VoiceClone);
    }
    None
}

fn normalize_identifier(input: &str) -> String {
    input
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_by_key() {
        assert_eq!(
            parse_voice_variant("custom_voice").unwrap(),
            VoiceVariant::CustomVoice
        );
        assert_eq!(
            parse_voice_variant("voice_design").unwrap(),
            VoiceVariant::VoiceDesign
        );
    }

    #[test]
    fn parse_by_repo_tail() {
        let parsed = parse_voice_variant("Qwen3-TTS-12Hz-1.7B-Base").unwrap();
        assert_eq!(parsed, VoiceVariant::VoiceClone);
    }

    #[test]
    fn parse_by_display_name() {
        let parsed = parse_voice_variant("Voice Design").unwrap();
        assert_eq!(parsed, VoiceVariant::VoiceDesign);
    }

    #[test]
    fn parse_by_heuristic() {
        assert_eq!(
            parse_voice_variant("my-customvoice-finetune").unwrap(),
            VoiceVariant::CustomVoice
        );
        assert_eq!(
            parse_voice_variant("qwen3-tts-clone").unwrap(),
            VoiceVariant::VoiceClone
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!(parse_voice_variant("").is_err());
        assert!(parse_voice_variant("qwen3-asr").is_err());
    }

    #[test]
    fn serde_uses_snake_case_keys() {
        let json = serde_json::to_string(&VoiceVariant::VoiceDesign).unwrap();
        assert_eq!(json, "\"voice_design\"");
    }
}
