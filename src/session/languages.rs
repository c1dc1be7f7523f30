/// Voice used when the target language has no mapped voice
pub const DEFAULT_VOICE: &str = "en-US-JennyNeural";

/// Synthesis voice for a language tag
pub fn voice_for(tag: &str) -> &'static str {
    match tag {
        "zh-TW" => "zh-TW-HsiaoChenNeural",
        "en-US" => "en-US-JennyNeural",
        "ja-JP" => "ja-JP-NanamiNeural",
        _ => DEFAULT_VOICE,
    }
}

/// Human-readable language name for the translation prompt, falling back to the tag
pub fn display_name(tag: &str) -> &str {
    match tag {
        "zh-TW" => "Traditional Chinese",
        "en-US" => "English",
        "ja-JP" => "Japanese",
        _ => tag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_voices() {
        assert_eq!(voice_for("ja-JP"), "ja-JP-NanamiNeural");
        assert_eq!(voice_for("zh-TW"), "zh-TW-HsiaoChenNeural");
        assert_eq!(voice_for("en-US"), "en-US-JennyNeural");
    }

    #[test]
    fn test_unmapped_voice_uses_default() {
        assert_eq!(voice_for("fr-FR"), DEFAULT_VOICE);
        assert_eq!(voice_for(""), DEFAULT_VOICE);
    }

    #[test]
    fn test_display_name_falls_back_to_tag() {
        assert_eq!(display_name("ja-JP"), "Japanese");
        assert_eq!(display_name("de-DE"), "de-DE");
    }
}
