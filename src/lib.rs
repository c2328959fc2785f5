pub mod bot;
pub mod config;
pub mod error;
pub mod services;

use std::sync::Arc;

use crate::config::BotConfig;
use crate::error::RelayError;
use crate::services::backend::{BackendClient, UploadBackend};
use crate::services::pending::ConversationStore;
use crate::services::relay::UploadRelay;
use crate::services::resolver::DuplicateResolver;

/// Shared handler state, injected into the dispatcher via dptree.
pub struct AppState {
    pub config: BotConfig,
    pub conversations: ConversationStore,
    pub relay: UploadRelay,
    pub resolver: DuplicateResolver,
}

impl AppState {
    pub fn new(config: BotConfig) -> Result<Self, RelayError> {
        let backend: Arc<dyn UploadBackend> = Arc::new(BackendClient::new(
            config.backend_url.clone(),
            config.source_tag.clone(),
            config.upload_timeout,
        )?);
        let conversations = ConversationStore::new();

        Ok(Self {
            relay: UploadRelay::new(backend.clone(), conversations.clone()),
            resolver: DuplicateResolver::new(
                backend,
                conversations.clone(),
                config.tokens.clone(),
            ),
            conversations,
            config,
        })
    }
}
