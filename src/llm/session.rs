use log::{ error, info, warn };
use std::sync::Arc;

use super::{ AiClient, Turn, CONNECTION_FALLBACK, NO_ANSWER_FALLBACK };

/// The long-lived chat with the model.
///
/// Sending takes `&mut self`, so turns on one session are serialized by the
/// borrow checker. The context only grows on successful, non-empty replies.
pub struct ConversationSession {
    client: Arc<AiClient>,
    system_instruction: String,
    turns: Vec<Turn>,
}

impl ConversationSession {
    pub fn new(client: Arc<AiClient>, system_instruction: &str) -> Self {
        Self {
            client,
            system_instruction: system_instruction.to_string(),
            turns: Vec::new(),
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Always yields displayable text: the reply, or a fallback string.
    pub async fn send(&mut self, text: &str) -> String {
        let generator = match self.client.generator() {
            Ok(g) => g,
            Err(e) => {
                error!("Error sending message to Gemini: {}", e);
                return CONNECTION_FALLBACK.to_string();
            }
        };

        let mut context = self.turns.clone();
        context.push(Turn::user(text));

        match generator.generate(Some(&self.system_instruction), &context).await {
            Ok(Some(reply)) if !reply.trim().is_empty() => {
                self.turns.push(Turn::user(text));
                self.turns.push(Turn::model(reply.clone()));
                info!("Conversation reply received ({} turns in context)", self.turns.len());
                reply
            }
            Ok(_) => {
                warn!("Gemini returned an empty reply");
                NO_ANSWER_FALLBACK.to_string()
            }
            Err(e) => {
                error!("Error sending message to Gemini: {}", e);
                CONNECTION_FALLBACK.to_string()
            }
        }
    }
}
