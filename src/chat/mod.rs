pub mod compose;
pub mod store;

use log::{ info, warn };
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::{ Arc, Mutex, MutexGuard };
use thiserror::Error;

use crate::llm::{ AiClient, ConversationSession, CARPENTER_PERSONA };
use crate::models::{ Language, Message };
use crate::storage::KeyValueStorage;
use self::compose::{ compose, Attachment, AttachmentError };
use self::store::ChatStore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("Nothing to send: type a message or attach a file")]
    Empty,
    #[error("The assistant is still answering the previous message")]
    Busy,
}

/// Result of one send: the user's message and the reply, both already
/// appended to the history.
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub question: Message,
    pub reply: Message,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatState {
    pub is_open: bool,
    pub is_loading: bool,
    pub messages: Vec<Message>,
}

/// Clears the loading flag however the send ends.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The floating chat widget: message log, its conversation with the model,
/// and the widget's UI flags.
pub struct ChatAssistant {
    store: Mutex<ChatStore>,
    session: tokio::sync::Mutex<ConversationSession>,
    loading: AtomicBool,
    open: AtomicBool,
    max_attachment_bytes: u64,
}

impl ChatAssistant {
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        client: &Arc<AiClient>,
        max_attachment_bytes: u64
    ) -> Self {
        Self {
            store: Mutex::new(ChatStore::open(storage)),
            session: tokio::sync::Mutex::new(client.open_session(CARPENTER_PERSONA)),
            loading: AtomicBool::new(false),
            open: AtomicBool::new(false),
            max_attachment_bytes,
        }
    }

    fn store(&self) -> MutexGuard<'_, ChatStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.store().messages().to_vec()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::SeqCst);
    }

    pub fn state(&self) -> ChatState {
        ChatState {
            is_open: self.is_open(),
            is_loading: self.is_loading(),
            messages: self.messages(),
        }
    }

    pub fn max_attachment_bytes(&self) -> u64 {
        self.max_attachment_bytes
    }

    pub fn attach_file(&self, path: &Path) -> Result<Attachment, AttachmentError> {
        Attachment::from_path(path, self.max_attachment_bytes)
    }

    pub fn attach_content(&self, name: &str, content: &str) -> Result<Attachment, AttachmentError> {
        Attachment::new(name, content, self.max_attachment_bytes)
    }

    /// Appends the user's message, asks the model and appends its reply.
    ///
    /// Rejected without touching the history when there is nothing to send
    /// or another reply is still pending.
    ///
    /// Not cancellation safe: dropping the future after the question is
    /// stored leaves it in the history without a reply.
    pub async fn send(
        &self,
        input: &str,
        attachment: Option<Attachment>,
        language: Language
    ) -> Result<Exchange, SendError> {
        let outgoing = compose(input, attachment.as_ref(), language).ok_or(SendError::Empty)?;

        if self.loading.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            warn!("Send rejected: a reply is already in progress");
            return Err(SendError::Busy);
        }
        let _loading = LoadingGuard(&self.loading);

        let question = Message::user(outgoing.display_text);
        self.store().append(question.clone());

        let reply_text = self.session.lock().await.send(&outgoing.prompt).await;

        let reply = Message::model(reply_text);
        self.store().append(reply.clone());
        info!("Chat exchange complete ({} messages)", self.store().messages().len());

        Ok(Exchange { question, reply })
    }

    pub fn clear(&self, confirmed: bool) -> bool {
        self.store().clear(confirmed)
    }
}
