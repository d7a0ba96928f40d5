mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use log::info;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage IO error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Synchronous string key-value slots, the durable side of the chat log.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub fn open_storage(data_dir: &str) -> Arc<dyn KeyValueStorage> {
    info!("Chat history will be stored in: {}", data_dir);
    Arc::new(FileStorage::new(data_dir))
}
