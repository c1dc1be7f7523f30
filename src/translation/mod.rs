//! Text translation collaborators
//!
//! A [`Translator`] turns one recognized utterance into the target language.
//! Languages are passed by display name since they end up in an LLM prompt.

mod gemini;

pub use gemini::GeminiTranslator;

use anyhow::Result;

#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_lang` to `target_lang`, returning only the translation
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;
}

/// Prompt asking for a bare translation with no commentary
pub fn translation_prompt(text: &str, source_lang: &str, target_lang: &str) -> String {
    format!(
        "Translate the following text from {} to {}. \
         Return only the translated text, without any additional explanation or text.\n\n\
         Original text:\n{}",
        source_lang, target_lang, text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_languages_and_forbids_commentary() {
        let prompt = translation_prompt("Hello there", "English", "Japanese");
        assert!(prompt.starts_with("Translate the following text from English to Japanese."));
        assert!(prompt.contains("Return only the translated text"));
        assert!(prompt.ends_with("Original text:\nHello there"));
    }
}
