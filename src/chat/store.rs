//! Transcript persistence.

use std::fmt;

use anyhow::Error;
use async_trait::async_trait;
use bson::doc;
use bson::oid::ObjectId;
use chrono::Utc;
use mongodb::{Collection, Database};

use super::models::{Chat, ChatMessage};
use crate::core::db::shared_db;

const COLLECTION: &str = "chats";

/// Failure modes of the store, kept distinct because the chat endpoint
/// maps them to different HTTP statuses.
#[derive(Debug)]
pub enum StoreError {
    /// The database could not be reached at all.
    Unavailable(Error),
    /// The database was reachable but a read or write failed.
    Persistence(Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(e) => write!(f, "Store unavailable: {}", e),
            StoreError::Persistence(e) => write!(f, "Store operation failed: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persistence seam for conversations.
///
/// Absence is not an error for `load`: a missing conversation comes back
/// as `Ok(None)` and the caller falls back to [`Chat::new`].
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Establishes or verifies the store connection. Runs once per
    /// request, before any conversation is resolved, so an unreachable
    /// store is reported even when the request doesn't name a chat.
    async fn connect(&self) -> Result<(), StoreError>;

    async fn load(&self, id: &str) -> Result<Option<Chat>, StoreError>;

    /// Appends `msg` to the in-memory transcript and then persists the
    /// whole conversation document. On failure the in-memory append is
    /// NOT rolled back, so the conversation may diverge from storage.
    async fn append_and_save(&self, chat: &mut Chat, msg: ChatMessage)
    -> Result<(), StoreError>;
}

/// MongoDB-backed store. Connects lazily through the process-wide
/// client in [`crate::core::db`] so the first request pays for the
/// connection and everyone after reuses it.
pub struct MongoStore {
    uri: String,
}

impl MongoStore {
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
        }
    }

    async fn collection(&self) -> Result<Collection<Chat>, StoreError> {
        let db: Database = shared_db(&self.uri).await.map_err(StoreError::Unavailable)?;
        Ok(db.collection(COLLECTION))
    }
}

#[async_trait]
impl TranscriptStore for MongoStore {
    async fn connect(&self) -> Result<(), StoreError> {
        self.collection().await.map(|_| ())
    }

    async fn load(&self, id: &str) -> Result<Option<Chat>, StoreError> {
        let coll = self.collection().await?;
        // A malformed id can't resolve to a document; surface it the
        // same way as any other failed read.
        let oid = ObjectId::parse_str(id)
            .map_err(|e| StoreError::Persistence(Error::from(e)))?;
        coll.find_one(doc! {"_id": oid})
            .await
            .map_err(|e| StoreError::Persistence(Error::from(e)))
    }

    async fn append_and_save(
        &self,
        chat: &mut Chat,
        msg: ChatMessage,
    ) -> Result<(), StoreError> {
        chat.push(msg);
        chat.updated_at = Utc::now();

        let coll = self.collection().await?;
        coll.replace_one(doc! {"_id": chat.id}, &*chat)
            .upsert(true)
            .await
            .map_err(|e| StoreError::Persistence(Error::from(e)))?;
        Ok(())
    }
}
