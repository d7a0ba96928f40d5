use async_trait::async_trait;
use log::info;

use super::{ GenerateError, TextGenerator, Turn, TurnRole, DEFAULT_MODEL };
use rllm::builder::{ LLMBackend, LLMBuilder };
use rllm::chat::{ ChatMessage, ChatRole, MessageType };

/// Google Gemini over `rllm`. A provider is built per request because the
/// system instruction is fixed at build time.
pub struct GeminiGenerator {
    api_key: String,
    model: String,
    base_url: Option<String>,
}

impl GeminiGenerator {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        let model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self { api_key, model, base_url }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn to_chat_message(turn: &Turn) -> ChatMessage {
    let role = match turn.role {
        TurnRole::User => ChatRole::User,
        TurnRole::Model => ChatRole::Assistant,
    };
    ChatMessage {
        role,
        content: turn.text.clone(),
        message_type: MessageType::Text,
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        turns: &[Turn]
    ) -> Result<Option<String>, GenerateError> {
        let mut builder = LLMBuilder::new()
            .backend(LLMBackend::Google)
            .api_key(self.api_key.clone())
            .model(&self.model)
            .stream(false);

        if let Some(system) = system_instruction {
            builder = builder.system(system);
        }
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }

        let provider = builder.build()?;
        let messages: Vec<ChatMessage> = turns.iter().map(to_chat_message).collect();

        info!(
            "GeminiGenerator::generate() → model={} turns={} base_url={:?}",
            self.model,
            messages.len(),
            self.base_url
        );
        let resp = provider.chat(&messages).await?;
        Ok(resp.text().map(|s| s.to_string()))
    }
}
