pub mod gemini;
pub mod session;

use async_trait::async_trait;
use log::{ debug, error, info };
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

use crate::models::Language;
use self::gemini::GeminiGenerator;
pub use self::session::ConversationSession;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const CARPENTER_PERSONA: &str =
    "You are an expert master carpenter and woodworking teacher. You are helpful, practical, and prioritize safety. You provide concise, rustic, and encouraging advice.";

/// Returned by the conversation when the model answered with no text.
pub const NO_ANSWER_FALLBACK: &str =
    "I'm sorry, I couldn't generate a response. Please try again.";

/// Returned by the conversation when the remote call failed.
pub const CONNECTION_FALLBACK: &str =
    "There was an error connecting to the workshop assistant. Please check your connection.";

const TRANSLATION_TEMPLATE: &str =
    "You are a professional translator for a technical woodworking book.
Translate the following text into {language}.
Maintain the formatting (Markdown), tone (rustic, authoritative yet accessible), and technical accuracy.

Text to translate:
{text}";

pub type GenerateError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API key missing: set API_KEY (or pass --api-key) to enable the AI assistant")]
    MissingApiKey,
}

#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

/// One entry of the multi-turn context sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: TurnRole::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: TurnRole::Model, text: text.into() }
    }
}

/// A remote text-generation endpoint.
///
/// `Ok(None)` means the call succeeded but produced no usable text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        turns: &[Turn]
    ) -> Result<Option<String>, GenerateError>;
}

/// Entry point to the AI service. Holds no conversation state itself; see
/// [`ConversationSession`] for the stateful chat.
pub struct AiClient {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl AiClient {
    /// Never fails: a missing API key is only reported when an operation runs.
    pub fn from_config(config: &LlmConfig) -> Self {
        let generator = config.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| {
                let generator = GeminiGenerator::new(
                    key.to_string(),
                    config.model.clone(),
                    config.base_url.clone()
                );
                info!("Gemini client configured: Model={}", generator.model());
                Arc::new(generator) as Arc<dyn TextGenerator>
            });
        Self { generator }
    }

    pub fn with_generator(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator: Some(generator) }
    }

    pub fn unconfigured() -> Self {
        Self { generator: None }
    }

    pub fn generator(&self) -> Result<Arc<dyn TextGenerator>, ConfigError> {
        self.generator.clone().ok_or_else(|| {
            error!("API key is missing from the configuration");
            ConfigError::MissingApiKey
        })
    }

    /// Opens the conversation used by the chat assistant.
    pub fn open_session(self: &Arc<Self>, system_instruction: &str) -> ConversationSession {
        ConversationSession::new(Arc::clone(self), system_instruction)
    }

    /// One-shot translation. Transport failures and empty replies fall back
    /// to the untranslated `text`; only a missing configuration is an error.
    pub async fn translate(&self, text: &str, target: Language) -> Result<String, ConfigError> {
        let generator = self.generator()?;
        let prompt = translation_prompt(text, target);
        debug!("Translating {} chars into {}", text.len(), target.english_name());

        match generator.generate(None, &[Turn::user(prompt)]).await {
            Ok(Some(translated)) if !translated.trim().is_empty() => Ok(translated),
            Ok(_) => {
                info!("Translation into {} returned no text, keeping original", target);
                Ok(text.to_string())
            }
            Err(e) => {
                error!("Translation error: {}", e);
                Ok(text.to_string())
            }
        }
    }
}

pub fn translation_prompt(text: &str, target: Language) -> String {
    TRANSLATION_TEMPLATE
        .replace("{language}", target.english_name())
        .replace("{text}", text)
}
