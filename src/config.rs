use anyhow::{Context, Result};
use serde::Deserialize;

/// Prefix for environment overrides, e.g. `TRANSLATOR__SPEECH__KEY`.
const ENV_PREFIX: &str = "TRANSLATOR";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub speech: SpeechConfig,
    pub translation: TranslationConfig,
    pub translator: TranslatorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Azure Speech credentials, shared by recognition and synthesis
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub key: String,
    pub region: String,
    /// Sample rate of the raw PCM pushed by clients
    pub sample_rate: u32,
}

/// Gemini credentials and model selection
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslatorConfig {
    pub default_source_lang: String,
    pub default_target_lang: String,
}

impl Config {
    /// Load configuration from an optional file at `path` (any format the
    /// `config` crate understands, extension optional) layered under
    /// `TRANSLATOR__*` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Self::builder()?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("service.name", "portfolio-translator")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 8000)?
            .set_default("speech.key", "")?
            .set_default("speech.region", "")?
            .set_default("speech.sample_rate", 16000)?
            .set_default("translation.api_key", "")?
            .set_default("translation.model", "gemini-1.5-flash-latest")?
            .set_default(
                "translation.endpoint",
                "https://generativelanguage.googleapis.com",
            )?
            .set_default("translator.default_source_lang", "en-US")?
            .set_default("translator.default_target_lang", "ja-JP")?)
    }
}
