use log::{ error, info, warn };
use std::sync::Arc;

use crate::models::Message;
use crate::storage::KeyValueStorage;

pub const STORAGE_KEY: &str = "practical_country_skills_chat_history";

pub const WELCOME_TEXT: &str =
    "Greetings! I'm your workshop assistant. Ask me about tools, wood types, or help with your current project.";

pub const CLEARED_TEXT: &str = "Greetings! I'm your workshop assistant. History has been cleared.";

/// Ordered chat log mirrored to durable storage as a whole snapshot.
pub struct ChatStore {
    storage: Arc<dyn KeyValueStorage>,
    messages: Vec<Message>,
}

impl ChatStore {
    /// Rehydrates the persisted log, or seeds the welcome message when there
    /// is none or it does not decode.
    pub fn open(storage: Arc<dyn KeyValueStorage>) -> Self {
        let messages = match load_snapshot(storage.as_ref()) {
            Some(messages) => {
                info!("Restored {} chat messages from storage", messages.len());
                messages
            }
            None => vec![Message::welcome(WELCOME_TEXT)],
        };
        Self { storage, messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.persist();
    }

    /// Does nothing unless `confirmed`. Returns whether the log was cleared.
    pub fn clear(&mut self, confirmed: bool) -> bool {
        if !confirmed {
            info!("Chat history clear not confirmed, keeping {} messages", self.messages.len());
            return false;
        }
        self.messages = vec![Message::welcome(CLEARED_TEXT)];
        if let Err(e) = self.storage.remove(STORAGE_KEY) {
            error!("Failed to remove chat history: {}", e);
        }
        info!("Chat history cleared");
        true
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.messages) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize chat history: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(STORAGE_KEY, &json) {
            error!("Failed to persist chat history: {}", e);
        }
    }
}

fn load_snapshot(storage: &dyn KeyValueStorage) -> Option<Vec<Message>> {
    let raw = match storage.get(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            return None;
        }
        Err(e) => {
            error!("Failed to read chat history: {}", e);
            return None;
        }
    };
    match serde_json::from_str::<Vec<Message>>(&raw) {
        Ok(messages) if messages.is_empty() => {
            warn!("Stored chat history is empty, reseeding");
            None
        }
        Ok(messages) => Some(messages),
        Err(e) => {
            error!("Failed to parse chat history: {}", e);
            None
        }
    }
}
