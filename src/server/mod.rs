pub mod api;

use crate::chat::ChatAssistant;
use crate::reader::Reader;
use self::api::AppState;
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    addr: String,
    reader: Arc<Reader>,
    chat: Arc<ChatAssistant>,
}

impl Server {
    pub fn new(addr: String, reader: Arc<Reader>, chat: Arc<ChatAssistant>) -> Self {
        Self { addr, reader, chat }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let state = AppState {
            reader: Arc::clone(&self.reader),
            chat: Arc::clone(&self.chat),
        };
        api::start_http_server(&self.addr, state).await
    }
}
