pub mod models;
pub mod store;

pub use models::{CONTEXT_WINDOW, Chat, ChatMessage, Role};
pub use store::{MongoStore, StoreError, TranscriptStore};
