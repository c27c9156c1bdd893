use std::sync::Arc;

use crate::chat::TranscriptStore;
use crate::core::AppConfig;

pub struct AppState {
    pub store: Arc<dyn TranscriptStore>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn TranscriptStore>, config: AppConfig) -> Self {
        Self { store, config }
    }
}
