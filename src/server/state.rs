//! Shared application state

use axum::extract::FromRef;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{GoogleOAuth, SessionKeys};
use crate::chat::ChatService;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::storage::PathResolver;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything a handler needs, built once from the configuration
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub resolver: Arc<PathResolver>,
    pub sessions: Arc<SessionKeys>,
    pub oauth: Arc<GoogleOAuth>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let client = Client::builder().timeout(UPSTREAM_TIMEOUT).build()?;

        Ok(Self {
            resolver: Arc::new(PathResolver::new(config.server.storage_root_path())),
            sessions: Arc::new(SessionKeys::new(
                &config.auth.secret_key,
                config.auth.token_lifetime(),
            )),
            oauth: Arc::new(GoogleOAuth::new(client.clone(), &config)),
            chat: Arc::new(ChatService::new(client, &config.chat)),
            config: Arc::new(config),
        })
    }

    pub fn storage_root(&self) -> PathBuf {
        self.resolver.storage_root().to_path_buf()
    }
}

impl FromRef<AppState> for Arc<SessionKeys> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.sessions)
    }
}
