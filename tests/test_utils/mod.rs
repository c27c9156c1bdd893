//! Test utilities for integration tests
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;

use chatrelay::api::AppState;
use chatrelay::api::app;
use chatrelay::chat::{Chat, ChatMessage, StoreError, TranscriptStore};
use chatrelay::core::AppConfig;

/// In-memory transcript store keyed by the chat id's hex form. Counts
/// every call so tests can assert the store was (or wasn't) touched.
pub struct MemoryStore {
    chats: Mutex<HashMap<String, Chat>>,
    pub calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            chats: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn insert(&self, chat: Chat) {
        self.chats
            .lock()
            .unwrap()
            .insert(chat.id.to_hex(), chat);
    }

    pub fn get(&self, id: &str) -> Option<Chat> {
        self.chats.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.chats.lock().unwrap().len()
    }

    /// The only chat in the store; panics when there isn't exactly one.
    pub fn only_chat(&self) -> Chat {
        let chats = self.chats.lock().unwrap();
        assert_eq!(chats.len(), 1, "expected exactly one stored chat");
        chats.values().next().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptStore for MemoryStore {
    async fn connect(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<Chat>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(id))
    }

    async fn append_and_save(
        &self,
        chat: &mut Chat,
        msg: ChatMessage,
    ) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        chat.push(msg);
        self.insert(chat.clone());
        Ok(())
    }
}

/// Store whose every operation fails as if the server was unreachable.
pub struct UnavailableStore;

#[async_trait]
impl TranscriptStore for UnavailableStore {
    async fn connect(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(anyhow::anyhow!(
            "connection refused"
        )))
    }

    async fn load(&self, _id: &str) -> Result<Option<Chat>, StoreError> {
        Err(StoreError::Unavailable(anyhow::anyhow!(
            "connection refused"
        )))
    }

    async fn append_and_save(
        &self,
        _chat: &mut Chat,
        _msg: ChatMessage,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(anyhow::anyhow!(
            "connection refused"
        )))
    }
}

/// Store that is reachable but fails every read and write.
pub struct BrokenStore;

#[async_trait]
impl TranscriptStore for BrokenStore {
    // Reachable, so requests get past the connection check and fail on
    // the read or write instead
    async fn connect(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load(&self, _id: &str) -> Result<Option<Chat>, StoreError> {
        Err(StoreError::Persistence(anyhow::anyhow!("bad object id")))
    }

    async fn append_and_save(
        &self,
        _chat: &mut Chat,
        _msg: ChatMessage,
    ) -> Result<(), StoreError> {
        Err(StoreError::Persistence(anyhow::anyhow!("write failed")))
    }
}

/// Creates a test application router backed by the given store, with
/// the inference endpoint pointed at `ollama_url` (typically a mockito
/// server).
pub fn test_app(store: Arc<dyn TranscriptStore>, ollama_url: &str) -> Router {
    let config = AppConfig {
        mongodb_uri: String::from("mongodb://unused:27017/test"),
        ollama_api_url: format!("{}/api/chat", ollama_url),
        ollama_model: String::from("test-model"),
    };
    let state = AppState::new(store, config);
    app(Arc::new(RwLock::new(state)))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
