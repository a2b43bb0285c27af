//! Boundary traits for the external collaborators.
//!
//! The core never talks to the messaging platform or the persistence layer
//! directly; listeners resolve these trait objects from the container
//! (`Arc<dyn MessagingApi>`, `Arc<dyn Storage>`) and the runtime binds the
//! concrete implementations during bootstrap.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Value, json};

use crate::error::{ApiResult, StorageResult};
use crate::injectable;

/// The remote messaging platform client, request/response over HTTP.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Performs one API call and returns the platform's `result` payload.
    async fn call(&self, method: &str, params: Value) -> ApiResult<Value>;

    /// Sends an HTML-formatted text message to a chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> ApiResult<Value> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
            }),
        )
        .await
    }
}

injectable!(opaque dyn MessagingApi);

/// The persistence boundary: namespaced JSON documents.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Reads a document, `None` when absent.
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Value>>;

    /// Writes (or replaces) a document.
    async fn put(&self, namespace: &str, key: &str, value: Value) -> StorageResult<()>;

    /// Removes a document; absent keys are not an error.
    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<()>;
}

injectable!(opaque dyn Storage);

/// In-memory [`Storage`] used by tests and as the default binding when no
/// real backend is configured. Contents vanish with the invocation, which
/// matches the core's no-persistence model.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<(String, String), Value>>,
}

injectable!(default MemoryStorage);

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents across all namespaces.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Value>> {
        Ok(self
            .entries
            .read()
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    async fn put(&self, namespace: &str, key: &str, value: Value) -> StorageResult<()> {
        self.entries
            .write()
            .insert((namespace.to_string(), key.to_string()), value);
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<()> {
        self.entries
            .write()
            .remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        storage
            .put("channels", "42", json!({ "title": "News" }))
            .await
            .unwrap();

        let loaded = storage.get("channels", "42").await.unwrap().unwrap();
        assert_eq!(loaded["title"], "News");
        assert!(storage.get("channels", "7").await.unwrap().is_none());

        storage.delete("channels", "42").await.unwrap();
        assert!(storage.is_empty());
    }
}
